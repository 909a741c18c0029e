//! A single tracked individual.

use serde::{Deserialize, Serialize};

use crate::ids::{CreatureUid, LocationId};
use crate::value_objects::{CaptureStatus, CreatureName, Nickname, SpeciesId};

/// One captured or assigned individual.
///
/// # Invariants
///
/// - `uid` identifies the individual, not the species: two creatures of the
///   same species in different slots always carry different uids
/// - `nickname` is at most 12 characters (enforced by `Nickname`)
///
/// # Example
///
/// ```
/// use nuzlocke_domain::entities::Creature;
/// use nuzlocke_domain::value_objects::{CreatureName, SpeciesId};
///
/// let pikachu = Creature::new(SpeciesId::new(25).unwrap(), 25, CreatureName::new("Pikachu").unwrap());
/// let other = Creature::new(SpeciesId::new(25).unwrap(), 25, CreatureName::new("Pikachu").unwrap());
///
/// assert!(!pikachu.is_same_individual(&other));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creature {
    #[serde(rename = "uniqueId", alias = "uid")]
    uid: CreatureUid,
    species_id: SpeciesId,
    #[serde(default)]
    display_id: u32,
    name: CreatureName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nickname: Option<Nickname>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<CaptureStatus>,
    #[serde(
        rename = "originLocationId",
        alias = "originLocation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    origin_location: Option<LocationId>,
}

impl Creature {
    /// Create a new individual with a freshly generated uid.
    pub fn new(species_id: SpeciesId, display_id: u32, name: CreatureName) -> Self {
        Self {
            uid: CreatureUid::generate(),
            species_id,
            display_id,
            name,
            nickname: None,
            status: None,
            origin_location: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn uid(&self) -> &CreatureUid {
        &self.uid
    }

    #[inline]
    pub fn species_id(&self) -> SpeciesId {
        self.species_id
    }

    #[inline]
    pub fn display_id(&self) -> u32 {
        self.display_id
    }

    #[inline]
    pub fn name(&self) -> &CreatureName {
        &self.name
    }

    #[inline]
    pub fn nickname(&self) -> Option<&Nickname> {
        self.nickname.as_ref()
    }

    #[inline]
    pub fn status(&self) -> Option<CaptureStatus> {
        self.status
    }

    #[inline]
    pub fn origin_location(&self) -> Option<&LocationId> {
        self.origin_location.as_ref()
    }

    /// Nickname if set, species name otherwise.
    pub fn label(&self) -> &str {
        self.nickname
            .as_ref()
            .map_or(self.name.as_str(), Nickname::as_str)
    }

    /// Identity check for instance-level operations. Species and name are
    /// deliberately ignored.
    pub fn is_same_individual(&self, other: &Creature) -> bool {
        self.uid == other.uid
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    pub fn with_nickname(mut self, nickname: Nickname) -> Self {
        self.nickname = Some(nickname);
        self
    }

    pub fn with_status(mut self, status: CaptureStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_origin(mut self, location: LocationId) -> Self {
        self.origin_location = Some(location);
        self
    }

    // =========================================================================
    // Mutation Methods
    // =========================================================================

    pub fn set_nickname(&mut self, nickname: Option<Nickname>) {
        self.nickname = nickname;
    }

    pub fn set_status(&mut self, status: Option<CaptureStatus>) {
        self.status = status;
    }

    /// Record where this individual was first assigned, unless already known.
    pub(crate) fn stamp_origin(&mut self, location: &LocationId) {
        if self.origin_location.is_none() {
            self.origin_location = Some(location.clone());
        }
    }

    /// Fill an unset status from the other half of a fusion. Never overwrites.
    pub(crate) fn fill_status_from(&mut self, other: &Creature) {
        if self.status.is_none() {
            self.status = other.status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pikachu() -> Creature {
        Creature::new(
            SpeciesId::new(25).unwrap(),
            25,
            CreatureName::new("Pikachu").unwrap(),
        )
    }

    #[test]
    fn same_species_is_not_same_individual() {
        let a = pikachu();
        let b = pikachu();
        assert!(!a.is_same_individual(&b));
        assert!(a.is_same_individual(&a.clone()));
    }

    #[test]
    fn origin_is_only_stamped_once() {
        let mut creature = pikachu();
        creature.stamp_origin(&LocationId::from("route-1"));
        creature.stamp_origin(&LocationId::from("route-2"));
        assert_eq!(creature.origin_location().unwrap().as_str(), "route-1");
    }

    #[test]
    fn status_fill_never_overwrites() {
        let dead = pikachu().with_status(CaptureStatus::Deceased);
        let mut caught = pikachu().with_status(CaptureStatus::Captured);
        caught.fill_status_from(&dead);
        assert_eq!(caught.status(), Some(CaptureStatus::Captured));

        let mut unset = pikachu();
        unset.fill_status_from(&dead);
        assert_eq!(unset.status(), Some(CaptureStatus::Deceased));
    }

    #[test]
    fn label_prefers_nickname() {
        let creature = pikachu().with_nickname(Nickname::new("Sparky").unwrap());
        assert_eq!(creature.label(), "Sparky");
        assert_eq!(pikachu().label(), "Pikachu");
    }

    #[test]
    fn stored_field_names_are_read() {
        let json = r#"{
            "uniqueId": "abc",
            "speciesId": 4,
            "displayId": 4,
            "name": "Charmander",
            "originLocationId": "route-3"
        }"#;
        let creature: Creature = serde_json::from_str(json).unwrap();
        assert_eq!(creature.uid().as_str(), "abc");
        assert_eq!(creature.origin_location().unwrap().as_str(), "route-3");
        assert_eq!(creature.status(), None);
    }

    #[test]
    fn in_memory_field_names_are_accepted() {
        let json = r#"{"uid": "xyz", "speciesId": 1, "name": "Bulbasaur", "originLocation": "route-1"}"#;
        let creature: Creature = serde_json::from_str(json).unwrap();
        assert_eq!(creature.uid().as_str(), "xyz");
        assert_eq!(creature.origin_location().unwrap().as_str(), "route-1");
    }

    #[test]
    fn serialized_creature_uses_stored_key_set() {
        let mut creature = pikachu();
        creature.stamp_origin(&LocationId::from("route-1"));
        let value = serde_json::to_value(&creature).unwrap();

        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            vec!["displayId", "name", "originLocationId", "speciesId", "uniqueId"]
        );
    }
}
