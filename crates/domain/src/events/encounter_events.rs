//! Encounter mutation outcomes.

use crate::ids::LocationId;
use crate::value_objects::{Composition, GameMode, VariantKey};

/// What one mutation did to one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotChange {
    pub location: LocationId,
    pub before: Composition,
    pub after: Composition,
    /// Variant key the slot carried before the mutation. Used to restore it
    /// when the catalog cannot be reached.
    pub previous_variant: Option<VariantKey>,
}

impl SlotChange {
    pub fn composition_changed(&self) -> bool {
        self.before != self.after
    }
}

/// Outcome of a Mutation Engine operation.
///
/// An empty outcome means the operation was a no-op (missing location, empty
/// source, nothing to swap) and nothing in the playthrough changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncounterUpdate {
    changes: Vec<SlotChange>,
}

impl EncounterUpdate {
    pub fn none() -> Self {
        Self::default()
    }

    pub(crate) fn from_changes(changes: Vec<SlotChange>) -> Self {
        Self { changes }
    }

    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[SlotChange] {
        &self.changes
    }

    pub fn locations(&self) -> impl Iterator<Item = &LocationId> {
        self.changes.iter().map(|c| &c.location)
    }

    /// Changes whose composition differs, i.e. the ones that need a variant
    /// lookup. Edits like a nickname change are not included.
    pub fn composition_changes(&self) -> impl Iterator<Item = &SlotChange> {
        self.changes.iter().filter(|c| c.composition_changed())
    }
}

/// Outcome of updating playthrough-level fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaythroughUpdate {
    Renamed { from: String, to: String },
    GameModeChanged { from: GameMode, to: GameMode },
    CustomLocationAdded { id: LocationId },
    CustomLocationRenamed { id: LocationId },
    CustomLocationRemoved { id: LocationId, had_encounter: bool },
    Unchanged,
}

impl PlaythroughUpdate {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}
