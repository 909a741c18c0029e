//! JSON-file key-value store for desktop use.
//!
//! All keys live in one JSON object on disk. Reads are served from an
//! in-memory cache; every write rewrites the file through a temp file and a
//! rename so a crash never leaves a half-written file behind.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use directories::ProjectDirs;
use tokio::sync::Mutex;

use crate::infrastructure::ports::{KeyValueStore, StoreError};

/// File-backed store. Values are kept as UTF-8 strings in the file.
pub struct JsonFileStore {
    /// Path to the storage file
    path: PathBuf,
    /// In-memory cache of stored values
    cache: RwLock<HashMap<String, String>>,
    /// Serializes file writes so an older snapshot never lands last
    write_guard: Mutex<()>,
}

impl JsonFileStore {
    /// Platform config directory, or the working directory if none exists.
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = ProjectDirs::from("io", "nuzlocke", "tracker") {
            dirs.config_dir().join("storage.json")
        } else {
            PathBuf::from("nuzlocke_storage.json")
        }
    }

    /// Open the store, loading existing data from `path` if it exists.
    ///
    /// An unreadable file is moved aside to `<path>.corrupt` and the store
    /// starts empty, so the next write does not destroy it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = load_file(&path);

        tracing::debug!(path = %path.display(), entries = cache.len(), "File storage initialized");

        Self {
            path,
            cache: RwLock::new(cache),
            write_guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the cache to disk.
    async fn persist(&self) -> Result<(), StoreError> {
        let _guard = self.write_guard.lock().await;

        let data = {
            let cache = self
                .cache
                .read()
                .map_err(|e| StoreError::io("persist", format!("lock poisoned: {e}")))?;
            serde_json::to_string_pretty(&*cache).map_err(|e| StoreError::io("persist", e))?
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::io("create_dir", e))?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data)
            .await
            .map_err(|e| StoreError::io("write", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::io("rename", e))?;

        Ok(())
    }
}

fn load_file(path: &Path) -> HashMap<String, String> {
    if !path.exists() {
        return HashMap::new();
    }

    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|data| {
            serde_json::from_str::<HashMap<String, String>>(&data).map_err(|e| e.to_string())
        });

    match parsed {
        Ok(map) => map,
        Err(e) => {
            let backup = path.with_extension("json.corrupt");
            tracing::warn!(
                path = %path.display(),
                backup = %backup.display(),
                error = %e,
                "Failed to read storage file, starting empty"
            );
            if let Err(e) = fs::rename(path, &backup) {
                tracing::error!(error = %e, "Failed to move unreadable storage file aside");
            }
            HashMap::new()
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let cache = self
            .cache
            .read()
            .map_err(|e| StoreError::io("get", format!("lock poisoned: {e}")))?;
        Ok(cache.get(key).map(|value| value.clone().into_bytes()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let value = String::from_utf8(value).map_err(|e| StoreError::encoding(key, e))?;
        {
            let mut cache = self
                .cache
                .write()
                .map_err(|e| StoreError::io("set", format!("lock poisoned: {e}")))?;
            cache.insert(key.to_string(), value);
        } // Release lock before I/O
        self.persist().await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let removed = {
            let mut cache = self
                .cache
                .write()
                .map_err(|e| StoreError::io("delete", format!("lock poisoned: {e}")))?;
            cache.remove(key).is_some()
        };
        if removed {
            self.persist().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let store = JsonFileStore::open(&path);
        store.set("nuzlocke:index", br#"{"a":1}"#.to_vec()).await.unwrap();
        store.set("other", b"x".to_vec()).await.unwrap();
        store.delete("other").await.unwrap();

        let reopened = JsonFileStore::open(&path);
        assert_eq!(
            reopened.get("nuzlocke:index").await.unwrap(),
            Some(br#"{"a":1}"#.to_vec())
        );
        assert_eq!(reopened.get("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_file_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::open(&path);

        assert_eq!(store.get("anything").await.unwrap(), None);
        assert!(path.with_extension("json.corrupt").exists());
    }

    #[tokio::test]
    async fn non_utf8_value_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("storage.json"));

        let result = store.set("k", vec![0xff, 0xfe]).await;
        assert!(matches!(result, Err(StoreError::Encoding { .. })));
    }
}
