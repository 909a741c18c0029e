//! Playthrough aggregate - one tracked game session
//!
//! # Rustic DDD Design
//!
//! - **Private fields**: the encounter map is only reachable through the
//!   mutation methods (see `mutations.rs`), which keep the slot invariants
//! - **Newtypes**: `PlaythroughName`, `LocationId`, `CreatureUid`
//! - **Outcome values**: every mutation returns what it changed instead of
//!   publishing anything itself

mod mutations;
mod wire;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{
    ordered_locations, Creature, CustomLocation, EncounterSlot, SlotPart, SlotState,
};
use crate::events::PlaythroughUpdate;
use crate::ids::{CreatureUid, LocationId, PlaythroughId};
use crate::value_objects::{CaptureStatus, GameMode, LocationName, PlaythroughName};

/// A tracked playthrough.
///
/// # Invariants
///
/// - `encounters` never holds an empty non-fusion slot
/// - a creature uid appears at most once across all slots (kept by the
///   mutation engine: moves and swaps relocate, they never copy)
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use nuzlocke_domain::aggregates::Playthrough;
/// use nuzlocke_domain::value_objects::{GameMode, PlaythroughName};
///
/// let run = Playthrough::new(PlaythroughName::new("Emerald").unwrap(), GameMode::Classic, Utc::now());
///
/// assert_eq!(run.name().as_str(), "Emerald");
/// assert!(run.encounters().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "wire::PlaythroughRecord", into = "wire::PlaythroughRecord")]
pub struct Playthrough {
    // Identity
    id: PlaythroughId,

    // Core attributes
    name: PlaythroughName,
    game_mode: GameMode,

    // Owned data
    encounters: BTreeMap<LocationId, EncounterSlot>,
    custom_locations: Vec<CustomLocation>,

    // Timestamps
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Playthrough {
    // =========================================================================
    // Constructor
    // =========================================================================

    pub fn new(name: PlaythroughName, game_mode: GameMode, now: DateTime<Utc>) -> Self {
        Self {
            id: PlaythroughId::new(),
            name,
            game_mode,
            encounters: BTreeMap::new(),
            custom_locations: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> PlaythroughId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &PlaythroughName {
        &self.name
    }

    #[inline]
    pub fn game_mode(&self) -> GameMode {
        self.game_mode
    }

    #[inline]
    pub fn encounters(&self) -> &BTreeMap<LocationId, EncounterSlot> {
        &self.encounters
    }

    pub fn encounter(&self, location: &LocationId) -> Option<&EncounterSlot> {
        self.encounters.get(location)
    }

    #[inline]
    pub fn custom_locations(&self) -> &[CustomLocation] {
        &self.custom_locations
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Every creature in the playthrough with where it sits.
    pub fn creatures(&self) -> impl Iterator<Item = (&LocationId, SlotPart, &Creature)> {
        self.encounters.iter().flat_map(|(location, slot)| {
            slot.creatures()
                .map(move |(part, creature)| (location, part, creature))
        })
    }

    /// Shape of the slot at `location`; `Absent` when nothing is recorded there.
    pub fn slot_state(&self, location: &LocationId) -> SlotState {
        self.encounters
            .get(location)
            .map_or(SlotState::Absent, EncounterSlot::state)
    }

    /// Where a given individual currently sits.
    pub fn find_creature(&self, uid: &CreatureUid) -> Option<(&LocationId, SlotPart, &Creature)> {
        self.creatures().find(|(_, _, creature)| creature.uid() == uid)
    }

    /// How many creatures carry each status. Creatures without a status are
    /// not counted.
    pub fn status_counts(&self) -> BTreeMap<CaptureStatus, usize> {
        let mut counts = BTreeMap::new();
        for (_, _, creature) in self.creatures() {
            if let Some(status) = creature.status() {
                *counts.entry(status).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Base locations with this playthrough's custom locations spliced in.
    pub fn ordered_locations(&self, base: &[LocationId]) -> Vec<LocationId> {
        ordered_locations(base, &self.custom_locations)
    }

    // =========================================================================
    // Playthrough-level Mutations
    // =========================================================================

    pub fn rename(&mut self, name: PlaythroughName, now: DateTime<Utc>) -> PlaythroughUpdate {
        if self.name == name {
            return PlaythroughUpdate::Unchanged;
        }
        let from = std::mem::replace(&mut self.name, name);
        self.updated_at = now;
        PlaythroughUpdate::Renamed {
            from: from.into(),
            to: self.name.to_string(),
        }
    }

    pub fn set_game_mode(&mut self, mode: GameMode, now: DateTime<Utc>) -> PlaythroughUpdate {
        if self.game_mode == mode {
            return PlaythroughUpdate::Unchanged;
        }
        let from = std::mem::replace(&mut self.game_mode, mode);
        self.updated_at = now;
        PlaythroughUpdate::GameModeChanged { from, to: mode }
    }

    pub fn add_custom_location(
        &mut self,
        name: LocationName,
        insert_after: LocationId,
        now: DateTime<Utc>,
    ) -> PlaythroughUpdate {
        let location = CustomLocation::new(name, insert_after);
        let id = location.id().clone();
        self.custom_locations.push(location);
        self.updated_at = now;
        PlaythroughUpdate::CustomLocationAdded { id }
    }

    pub fn rename_custom_location(
        &mut self,
        id: &LocationId,
        name: LocationName,
        now: DateTime<Utc>,
    ) -> PlaythroughUpdate {
        let Some(location) = self.custom_locations.iter_mut().find(|l| l.id() == id) else {
            return PlaythroughUpdate::Unchanged;
        };
        location.set_name(name);
        self.updated_at = now;
        PlaythroughUpdate::CustomLocationRenamed { id: id.clone() }
    }

    /// Remove a custom location together with its encounter. Custom
    /// locations anchored on the removed one are re-anchored on its anchor so
    /// they keep their place in the route.
    pub fn remove_custom_location(&mut self, id: &LocationId, now: DateTime<Utc>) -> PlaythroughUpdate {
        let Some(index) = self.custom_locations.iter().position(|l| l.id() == id) else {
            return PlaythroughUpdate::Unchanged;
        };
        let removed = self.custom_locations.remove(index);
        for location in &mut self.custom_locations {
            if location.insert_after() == id {
                location.set_insert_after(removed.insert_after().clone());
            }
        }
        let had_encounter = self.encounters.remove(id).is_some();
        self.updated_at = now;
        PlaythroughUpdate::CustomLocationRemoved {
            id: id.clone(),
            had_encounter,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
