//! Domain model for tracking Nuzlocke encounters.
//!
//! Pure state and rules: no I/O, no async, no clock. Every mutation takes
//! `now` from the caller and returns what it changed.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod value_objects;

pub use aggregates::Playthrough;
pub use entities::{ordered_locations, Creature, CustomLocation, EncounterSlot, SlotPart, SlotState};
pub use error::DomainError;
pub use events::{EncounterUpdate, PlaythroughUpdate, SlotChange};
pub use ids::{CreatureUid, LocationId, PlaythroughId};
pub use value_objects::{
    CaptureStatus, Composition, CreatureName, CycleDirection, GameMode, LocationName, Nickname,
    PlaythroughName, SpeciesId, VariantKey, MAX_NICKNAME_LENGTH,
};
