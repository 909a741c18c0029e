//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Durable storage (could swap a JSON file for browser storage or SQLite)
//! - The artwork variant catalog (could swap in-memory for an HTTP index)
//! - Species lookup (the game data table lives outside the engine)
//! - Clock (for testing)

mod error;
mod external;
mod testing;

pub use error::{CatalogError, StoreError};
pub use external::{KeyValueStore, SpeciesLookup, SpeciesRef, VariantCatalog};
pub use testing::ClockPort;

#[cfg(test)]
pub use external::{MockKeyValueStore, MockSpeciesLookup, MockVariantCatalog};
#[cfg(test)]
pub use testing::MockClockPort;
