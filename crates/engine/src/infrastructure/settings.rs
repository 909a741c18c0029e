//! Engine configuration from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `NUZLOCKE_SAVE_DEBOUNCE_MS` | `500` |
//! | `NUZLOCKE_STORAGE_PATH` | platform config dir, `storage.json` |
//! | `NUZLOCKE_STORAGE_PREFIX` | `nuzlocke` |
//! | `NUZLOCKE_LOG` | `nuzlocke_engine=debug,nuzlocke_domain=info` |

use std::path::PathBuf;
use std::time::Duration;

use crate::infrastructure::storage::JsonFileStore;

/// Default delay between the last encounter edit and the write that saves it.
pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 500;

/// Default namespace for persisted keys.
pub const DEFAULT_STORAGE_PREFIX: &str = "nuzlocke";

/// Default tracing filter when neither `NUZLOCKE_LOG` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "nuzlocke_engine=debug,nuzlocke_domain=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub save_debounce: Duration,
    pub storage_path: PathBuf,
    pub storage_prefix: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            save_debounce: Duration::from_millis(DEFAULT_SAVE_DEBOUNCE_MS),
            storage_path: JsonFileStore::default_path(),
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
        }
    }
}

impl EngineSettings {
    /// Read settings from the process environment. Call [`load_env_files`]
    /// and install tracing first so invalid values are reported.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup. Blank values count
    /// as unset; unparseable numbers fall back to the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| non_blank(lookup(name));
        let defaults = Self::default();

        let save_debounce = match var("NUZLOCKE_SAVE_DEBOUNCE_MS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(e) => {
                    tracing::warn!(value = %raw, error = %e, "Invalid NUZLOCKE_SAVE_DEBOUNCE_MS, using default");
                    defaults.save_debounce
                }
            },
            None => defaults.save_debounce,
        };

        Self {
            save_debounce,
            storage_path: var("NUZLOCKE_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            storage_prefix: var("NUZLOCKE_STORAGE_PREFIX").unwrap_or(defaults.storage_prefix),
        }
    }

    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }
}

/// Log filter from `NUZLOCKE_LOG`, readable before tracing is installed.
pub fn env_log_filter() -> Option<String> {
    non_blank(std::env::var("NUZLOCKE_LOG").ok())
}

/// Load `.env.local` and `.env` from the working directory if present.
/// Earlier files win. Returns the files that exist but failed to load; the
/// caller reports them once tracing is up.
pub fn load_env_files() -> Vec<(&'static str, dotenvy::Error)> {
    let mut failures = Vec::new();
    for filename in [".env.local", ".env"] {
        let path = std::path::Path::new(filename);
        if path.exists() {
            if let Err(e) = dotenvy::from_path(path) {
                failures.push((filename, e));
            }
        }
    }
    failures
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
