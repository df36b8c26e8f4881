//! # Home Graph Domain
//!
//! Domain types for the Home Graph sync and state-report client.
//!
//! This crate contains:
//! - Device state delta types (`StateChanges`)
//! - Error types and `Result` definitions
//! - Configuration structures and defaults
//!
//! ## Architecture
//! - No dependencies on other workspace crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::{HomeGraphConfig, RetryTuning, TokenTuning};
pub use errors::{HomeGraphError, Result};
pub use types::{DeviceId, StateChanges};
