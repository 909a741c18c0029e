//! Validated name newtypes
//!
//! These newtypes ensure that names are valid by construction:
//! - Non-empty
//! - Within length limits (counted in characters, not bytes)
//! - Trimmed of leading/trailing whitespace

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Maximum length for playthrough and location names
const MAX_NAME_LENGTH: usize = 100;

/// Maximum length for species display names
const MAX_CREATURE_NAME_LENGTH: usize = 50;

/// Maximum nickname length enforced by the games
pub const MAX_NICKNAME_LENGTH: usize = 12;

fn validated(value: String, label: &str, max: usize) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{label} cannot be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{label} cannot exceed {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

macro_rules! define_name {
    ($(#[$meta:meta])* $name:ident, $label:expr, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new validated value.
            ///
            /// # Errors
            ///
            /// Returns `DomainError::Validation` if the value is empty after
            /// trimming or exceeds the length limit.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                validated(value.into(), $label, $max).map(Self)
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(name: $name) -> String {
                name.0
            }
        }
    };
}

define_name!(
    /// A validated playthrough name (non-empty, <=100 chars, trimmed)
    PlaythroughName,
    "Playthrough name",
    MAX_NAME_LENGTH
);

define_name!(
    /// A validated custom location name (non-empty, <=100 chars, trimmed)
    LocationName,
    "Location name",
    MAX_NAME_LENGTH
);

define_name!(
    /// The species display name carried by a creature (non-empty, <=50 chars)
    CreatureName,
    "Creature name",
    MAX_CREATURE_NAME_LENGTH
);

define_name!(
    /// A creature nickname (non-empty, <=12 chars, trimmed)
    Nickname,
    "Nickname",
    MAX_NICKNAME_LENGTH
);

impl Nickname {
    /// Parse user input where an empty box means "no nickname".
    pub fn parse_optional(input: &str) -> Result<Option<Self>, DomainError> {
        if input.trim().is_empty() {
            return Ok(None);
        }
        Self::new(input).map(Some)
    }
}

impl PlaythroughName {
    /// Name given to the playthrough created when nothing could be loaded.
    pub fn default_name() -> Self {
        Self("My Nuzlocke".to_string())
    }
}
