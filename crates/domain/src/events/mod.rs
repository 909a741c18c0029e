//! Domain Events
//!
//! Return types from aggregate mutations, communicating what happened when
//! state was modified so the engine can decide what to resolve and persist.

pub mod encounter_events;

pub use encounter_events::*;
