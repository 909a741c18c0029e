//! Use cases - User story orchestration.
//!
//! Each module orchestrates one area across the store, persistence and the
//! external ports.

pub mod encounters;
pub mod playthroughs;
pub mod variants;

pub use encounters::EncounterUseCases;
pub use playthroughs::{PlaythroughSummary, PlaythroughUseCases};
pub use variants::VariantResolver;
