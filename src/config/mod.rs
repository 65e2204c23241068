//! Configuration and constants.
//!
//! This module provides:
//! - Default URLs, intervals and cache file names
//! - The library `Config` struct
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, ConfigValidationError, LogFormat, LogLevel, Opt};
