//! Species identifiers and slot compositions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Stable species/form identifier (always positive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SpeciesId(u32);

impl SpeciesId {
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for zero.
    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value == 0 {
            return Err(DomainError::validation("Species id must be positive"));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for SpeciesId {
    type Error = DomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SpeciesId> for u32 {
    fn from(value: SpeciesId) -> Self {
        value.0
    }
}

/// The `(head species, body species)` pair shown by a slot.
///
/// Artwork variants are remembered per composition, so two slots with equal
/// compositions share a preferred variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Composition {
    pub head: Option<SpeciesId>,
    pub body: Option<SpeciesId>,
}

impl Composition {
    pub const EMPTY: Composition = Composition {
        head: None,
        body: None,
    };

    pub fn new(head: Option<SpeciesId>, body: Option<SpeciesId>) -> Self {
        Self { head, body }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none() && self.body.is_none()
    }

    /// The species the catalog is keyed on first. A lone body half is looked
    /// up as if it were the head.
    pub fn lookup_key(&self) -> Option<(SpeciesId, Option<SpeciesId>)> {
        match (self.head, self.body) {
            (Some(head), body) => Some((head, body)),
            (None, Some(body)) => Some((body, None)),
            (None, None) => None,
        }
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |s: Option<SpeciesId>| s.map_or_else(|| "-".to_string(), |s| s.to_string());
        write!(f, "{}/{}", show(self.head), show(self.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_species_is_rejected() {
        assert!(SpeciesId::new(0).is_err());
        assert_eq!(SpeciesId::new(25).unwrap().get(), 25);
        assert!(serde_json::from_str::<SpeciesId>("0").is_err());
    }

    #[test]
    fn lookup_key_falls_back_to_body() {
        let pikachu = SpeciesId::new(25).unwrap();
        let charmander = SpeciesId::new(4).unwrap();

        assert_eq!(
            Composition::new(Some(pikachu), Some(charmander)).lookup_key(),
            Some((pikachu, Some(charmander)))
        );
        assert_eq!(
            Composition::new(None, Some(charmander)).lookup_key(),
            Some((charmander, None))
        );
        assert_eq!(Composition::EMPTY.lookup_key(), None);
    }

    #[test]
    fn display_marks_missing_halves() {
        let pikachu = SpeciesId::new(25).unwrap();
        assert_eq!(Composition::new(Some(pikachu), None).to_string(), "25/-");
    }
}
