//! Nuzlocke tracker engine library.
//!
//! ## Structure
//!
//! - `stores/` - In-memory playthrough state with change subscriptions
//! - `use_cases/` - Encounter, playthrough and variant orchestration
//! - `persistence/` - Debounced mirroring of the store into a key-value store
//! - `infrastructure/` - Port traits and their adapters, settings, tracing
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod persistence;
pub mod stores;
pub mod use_cases;

pub use app::App;
