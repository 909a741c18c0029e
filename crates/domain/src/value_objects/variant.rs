use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog key for one alternate artwork of a composition (e.g. `"25.4a"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantKey(String);

impl VariantKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VariantKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Direction for stepping through a composition's variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Forward,
    Backward,
}

impl CycleDirection {
    /// Index reached from `current` in a list of `len` entries, wrapping at
    /// both ends. `None` means "not in the list": forward starts at the first
    /// entry and backward at the last.
    pub fn step(self, current: Option<usize>, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let next = match (self, current) {
            (Self::Forward, None) => 0,
            (Self::Backward, None) => len - 1,
            (Self::Forward, Some(i)) => (i + 1) % len,
            (Self::Backward, Some(i)) => (i + len - 1) % len,
        };
        Some(next)
    }
}
