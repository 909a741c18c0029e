use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Which flavour of the game the playthrough is tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Classic,
    Remix,
    Randomized,
}

impl GameMode {
    /// Resolve the mode of a stored record that may carry the legacy
    /// `remixMode` flag. An explicit non-classic mode always wins; the flag
    /// only decides between classic and remix.
    pub fn from_legacy(explicit: Option<GameMode>, remix_mode: Option<bool>) -> GameMode {
        match (explicit, remix_mode) {
            (Some(mode), _) if mode != GameMode::Classic => mode,
            (_, Some(true)) => GameMode::Remix,
            (Some(mode), _) => mode,
            (None, _) => GameMode::Classic,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classic => write!(f, "classic"),
            Self::Remix => write!(f, "remix"),
            Self::Randomized => write!(f, "randomized"),
        }
    }
}

impl FromStr for GameMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "remix" => Ok(Self::Remix),
            "randomized" | "randomizer" => Ok(Self::Randomized),
            other => Err(DomainError::parse(format!("Unknown game mode: {other}"))),
        }
    }
}
