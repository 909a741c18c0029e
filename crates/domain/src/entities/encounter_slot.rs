//! One location's occupancy record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::creature::Creature;
use crate::error::DomainError;
use crate::value_objects::{Composition, VariantKey};

/// Which half of a slot an operation addresses.
///
/// A non-fusion slot only ever uses `Head`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPart {
    #[default]
    #[serde(alias = "primary")]
    Head,
    #[serde(alias = "secondary")]
    Body,
}

impl SlotPart {
    pub fn other(self) -> SlotPart {
        match self {
            SlotPart::Head => SlotPart::Body,
            SlotPart::Body => SlotPart::Head,
        }
    }
}

/// Observable shape of a slot. `Absent` is never stored; it describes a
/// location with no entry in the encounter map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Absent,
    Single,
    FusionPartial,
    FusionFull,
}

/// Occupancy of one location: a single creature or a head/body fusion.
///
/// # Invariants
///
/// - a non-fusion slot never has a body
/// - `preferred_variant` belongs to the current composition; callers that
///   change the composition go through the playthrough, which clears it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncounterSlotRecord", into = "EncounterSlotRecord")]
pub struct EncounterSlot {
    head: Option<Creature>,
    body: Option<Creature>,
    is_fusion: bool,
    preferred_variant: Option<VariantKey>,
    updated_at: DateTime<Utc>,
}

impl EncounterSlot {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// A plain, non-fusion slot.
    pub fn single(creature: Creature, now: DateTime<Utc>) -> Self {
        Self {
            head: Some(creature),
            body: None,
            is_fusion: false,
            preferred_variant: None,
            updated_at: now,
        }
    }

    /// A fusion with both halves present.
    pub fn fusion(head: Creature, body: Creature, now: DateTime<Utc>) -> Self {
        Self {
            head: Some(head),
            body: Some(body),
            is_fusion: true,
            preferred_variant: None,
            updated_at: now,
        }
    }

    /// An empty slot, fusion or not. Only fusion placeholders survive in the
    /// encounter map while empty.
    pub fn empty(is_fusion: bool, now: DateTime<Utc>) -> Self {
        Self {
            head: None,
            body: None,
            is_fusion,
            preferred_variant: None,
            updated_at: now,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn head(&self) -> Option<&Creature> {
        self.head.as_ref()
    }

    #[inline]
    pub fn body(&self) -> Option<&Creature> {
        self.body.as_ref()
    }

    #[inline]
    pub fn is_fusion(&self) -> bool {
        self.is_fusion
    }

    #[inline]
    pub fn preferred_variant(&self) -> Option<&VariantKey> {
        self.preferred_variant.as_ref()
    }

    #[inline]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn part(&self, part: SlotPart) -> Option<&Creature> {
        match part {
            SlotPart::Head => self.head.as_ref(),
            SlotPart::Body => self.body.as_ref(),
        }
    }

    /// Both halves empty.
    pub fn is_empty(&self) -> bool {
        self.head.is_none() && self.body.is_none()
    }

    /// Empty and not a fusion placeholder: such a slot must not be kept.
    pub fn is_removable(&self) -> bool {
        self.is_empty() && !self.is_fusion
    }

    pub fn composition(&self) -> Composition {
        Composition::new(
            self.head.as_ref().map(Creature::species_id),
            self.body.as_ref().map(Creature::species_id),
        )
    }

    pub fn state(&self) -> SlotState {
        match (self.is_fusion, &self.head, &self.body) {
            (false, _, _) => SlotState::Single,
            (true, Some(_), Some(_)) => SlotState::FusionFull,
            (true, _, _) => SlotState::FusionPartial,
        }
    }

    /// Halves currently present, head first.
    pub fn creatures(&self) -> impl Iterator<Item = (SlotPart, &Creature)> {
        self.head
            .iter()
            .map(|c| (SlotPart::Head, c))
            .chain(self.body.iter().map(|c| (SlotPart::Body, c)))
    }

    /// Which half holds the given individual.
    pub fn locate(&self, creature: &Creature) -> Option<SlotPart> {
        self.creatures()
            .find(|(_, c)| c.is_same_individual(creature))
            .map(|(part, _)| part)
    }

    // =========================================================================
    // Mutation Methods (crate-internal: the playthrough keeps the invariants)
    // =========================================================================

    /// Write one half. Writing a body promotes the slot to a fusion; clearing
    /// the body of a non-fusion slot is a no-op.
    pub(crate) fn put(&mut self, part: SlotPart, creature: Option<Creature>, now: DateTime<Utc>) {
        match part {
            SlotPart::Head => self.head = creature,
            SlotPart::Body => {
                if creature.is_some() {
                    self.is_fusion = true;
                }
                self.body = creature;
            }
        }
        self.updated_at = now;
    }

    pub(crate) fn take(&mut self, part: SlotPart, now: DateTime<Utc>) -> Option<Creature> {
        let taken = match part {
            SlotPart::Head => self.head.take(),
            SlotPart::Body => self.body.take(),
        };
        if taken.is_some() {
            self.updated_at = now;
        }
        taken
    }

    pub(crate) fn part_mut(&mut self, part: SlotPart) -> Option<&mut Creature> {
        match part {
            SlotPart::Head => self.head.as_mut(),
            SlotPart::Body => self.body.as_mut(),
        }
    }

    /// Exchange head and body in place.
    pub(crate) fn flip(&mut self, now: DateTime<Utc>) {
        std::mem::swap(&mut self.head, &mut self.body);
        self.updated_at = now;
    }

    /// Turn the fusion flag on or off. Turning it off keeps a single survivor
    /// (head wins over body) as the new head.
    pub(crate) fn set_fusion(&mut self, is_fusion: bool, now: DateTime<Utc>) {
        if !is_fusion {
            let survivor = self.head.take().or_else(|| self.body.take());
            self.head = survivor;
            self.body = None;
        }
        self.is_fusion = is_fusion;
        self.updated_at = now;
    }

    /// Sync statuses across the halves of a fusion: the half at `written`
    /// takes the other's status if it has none of its own.
    pub(crate) fn fill_status_gap(&mut self, written: SlotPart) {
        if !self.is_fusion {
            return;
        }
        let (target, source) = match written {
            SlotPart::Head => (self.head.as_mut(), self.body.as_ref()),
            SlotPart::Body => (self.body.as_mut(), self.head.as_ref()),
        };
        if let (Some(target), Some(source)) = (target, source) {
            target.fill_status_from(source);
        }
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub(crate) fn set_preferred_variant(&mut self, key: Option<VariantKey>) {
        self.preferred_variant = key;
    }
}

// ============================================================================
// Serde Implementation
// ============================================================================

/// Persisted shape of a slot: `primary`/`secondary` halves, `isComposite`,
/// `preferredVariantKey`, `lastModified`. The in-memory names are accepted
/// on read as well.
#[derive(Serialize, Deserialize)]
struct EncounterSlotRecord {
    #[serde(rename = "primary", alias = "head", default)]
    head: Option<Creature>,
    #[serde(rename = "secondary", alias = "body", default)]
    body: Option<Creature>,
    #[serde(rename = "isComposite", alias = "isFusion", default)]
    is_fusion: bool,
    #[serde(rename = "preferredVariantKey", alias = "preferredVariant", default)]
    preferred_variant: Option<VariantKey>,
    #[serde(rename = "lastModified", alias = "updatedAt")]
    updated_at: DateTime<Utc>,
}

impl TryFrom<EncounterSlotRecord> for EncounterSlot {
    type Error = DomainError;

    fn try_from(record: EncounterSlotRecord) -> Result<Self, Self::Error> {
        if !record.is_fusion && record.body.is_some() {
            return Err(DomainError::parse(
                "Non-fusion encounter slot cannot have a body",
            ));
        }
        Ok(Self {
            head: record.head,
            body: record.body,
            is_fusion: record.is_fusion,
            preferred_variant: record.preferred_variant,
            updated_at: record.updated_at,
        })
    }
}

impl From<EncounterSlot> for EncounterSlotRecord {
    fn from(slot: EncounterSlot) -> Self {
        Self {
            head: slot.head,
            body: slot.body,
            is_fusion: slot.is_fusion,
            preferred_variant: slot.preferred_variant,
            updated_at: slot.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{CaptureStatus, CreatureName, SpeciesId};

    fn creature(species: u32, name: &str) -> Creature {
        Creature::new(
            SpeciesId::new(species).unwrap(),
            species,
            CreatureName::new(name).unwrap(),
        )
    }

    mod shape {
        use super::*;

        #[test]
        fn writing_body_promotes_to_fusion() {
            let now = Utc::now();
            let mut slot = EncounterSlot::single(creature(25, "Pikachu"), now);
            slot.put(SlotPart::Body, Some(creature(4, "Charmander")), now);

            assert!(slot.is_fusion());
            assert_eq!(slot.state(), SlotState::FusionFull);
        }

        #[test]
        fn clearing_body_of_single_is_noop() {
            let now = Utc::now();
            let mut slot = EncounterSlot::single(creature(25, "Pikachu"), now);
            slot.put(SlotPart::Body, None, now);

            assert!(!slot.is_fusion());
            assert!(slot.head().is_some());
        }

        #[test]
        fn empty_fusion_is_kept_but_empty_single_is_not() {
            let now = Utc::now();
            assert!(!EncounterSlot::empty(true, now).is_removable());
            assert!(EncounterSlot::empty(false, now).is_removable());
        }

        #[test]
        fn defusing_keeps_body_when_head_missing() {
            let now = Utc::now();
            let mut slot = EncounterSlot::empty(true, now);
            slot.put(SlotPart::Body, Some(creature(4, "Charmander")), now);
            slot.set_fusion(false, now);

            assert!(!slot.is_fusion());
            assert_eq!(slot.head().unwrap().name().as_str(), "Charmander");
            assert!(slot.body().is_none());
        }

        #[test]
        fn composition_reads_both_halves() {
            let now = Utc::now();
            let slot = EncounterSlot::fusion(creature(25, "Pikachu"), creature(4, "Charmander"), now);
            let composition = slot.composition();

            assert_eq!(composition.head.unwrap().get(), 25);
            assert_eq!(composition.body.unwrap().get(), 4);
        }
    }

    mod status_sync {
        use super::*;

        #[test]
        fn written_half_takes_existing_status() {
            let now = Utc::now();
            let mut slot = EncounterSlot::single(
                creature(25, "Pikachu").with_status(CaptureStatus::Captured),
                now,
            );
            slot.put(SlotPart::Body, Some(creature(4, "Charmander")), now);
            slot.fill_status_gap(SlotPart::Body);

            assert_eq!(slot.body().unwrap().status(), Some(CaptureStatus::Captured));
        }

        #[test]
        fn existing_status_is_never_overwritten() {
            let now = Utc::now();
            let mut slot = EncounterSlot::fusion(
                creature(25, "Pikachu").with_status(CaptureStatus::Captured),
                creature(4, "Charmander").with_status(CaptureStatus::Deceased),
                now,
            );
            slot.fill_status_gap(SlotPart::Body);
            slot.fill_status_gap(SlotPart::Head);

            assert_eq!(slot.head().unwrap().status(), Some(CaptureStatus::Captured));
            assert_eq!(slot.body().unwrap().status(), Some(CaptureStatus::Deceased));
        }
    }

    mod serde {
        use super::*;

        #[test]
        fn stored_names_are_read() {
            let json = r#"{
                "primary": {"uniqueId": "a", "speciesId": 25, "displayId": 25, "name": "Pikachu"},
                "secondary": null,
                "isComposite": true,
                "preferredVariantKey": "25.a",
                "lastModified": "2024-01-15T10:30:00Z"
            }"#;
            let slot: EncounterSlot = serde_json::from_str(json).unwrap();

            assert!(slot.is_fusion());
            assert_eq!(slot.state(), SlotState::FusionPartial);
            assert_eq!(slot.preferred_variant().unwrap().as_str(), "25.a");
        }

        #[test]
        fn in_memory_names_are_accepted() {
            let json = r#"{
                "head": {"uid": "a", "speciesId": 25, "displayId": 25, "name": "Pikachu"},
                "body": null,
                "isFusion": true,
                "preferredVariant": "25.a",
                "updatedAt": "2024-01-15T10:30:00Z"
            }"#;
            let slot: EncounterSlot = serde_json::from_str(json).unwrap();

            assert_eq!(slot.state(), SlotState::FusionPartial);
            assert_eq!(slot.head().unwrap().uid().as_str(), "a");
            assert_eq!(slot.preferred_variant().unwrap().as_str(), "25.a");
        }

        #[test]
        fn single_with_body_is_rejected() {
            let json = r#"{
                "head": {"uid": "a", "speciesId": 25, "displayId": 25, "name": "Pikachu"},
                "body": {"uid": "b", "speciesId": 4, "displayId": 4, "name": "Charmander"},
                "isFusion": false,
                "updatedAt": "2024-01-15T10:30:00Z"
            }"#;
            assert!(serde_json::from_str::<EncounterSlot>(json).is_err());
        }

        #[test]
        fn serialized_slot_uses_stored_key_set() {
            let slot =
                EncounterSlot::fusion(creature(25, "Pikachu"), creature(4, "Charmander"), Utc::now());
            let value = serde_json::to_value(&slot).unwrap();

            let keys: Vec<&str> = value
                .as_object()
                .unwrap()
                .keys()
                .map(String::as_str)
                .collect();
            assert_eq!(
                keys,
                vec!["isComposite", "lastModified", "preferredVariantKey", "primary", "secondary"]
            );
            assert_eq!(value["isComposite"], true);
            assert!(value["preferredVariantKey"].is_null());
        }
    }
}
