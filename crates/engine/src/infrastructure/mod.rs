//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies, plus
//! settings and tracing setup.

pub mod catalog;
pub mod clock;
pub mod ports;
pub mod settings;
pub mod storage;
pub mod telemetry;
