//! In-memory state storage modules.
//!
//! Stores manage runtime state that durable storage only mirrors:
//! - `PlaythroughStore` - every loaded playthrough plus the active one

pub mod playthrough;

pub use playthrough::{PlaythroughStore, StoreEvent, SubscriptionId};
