//! Entities owned by the playthrough aggregate.

mod creature;
mod custom_location;
mod encounter_slot;

pub use creature::Creature;
pub use custom_location::{ordered_locations, CustomLocation};
pub use encounter_slot::{EncounterSlot, SlotPart, SlotState};
