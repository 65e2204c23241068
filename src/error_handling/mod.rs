//! Error handling.
//!
//! Errors are grouped by where they surface:
//! - **Configuration**: bad cache directory or malformed URL, reported to the caller of the setter
//! - **Data**: empty, malformed or corrupt remote data, reported as a failed refresh
//! - **I/O**: cache write failures, reported as a failed refresh
//! - **Pattern**: malformed signatures, treated as "does not match" (see `store::PatternError`)

mod types;

// Re-export public API
pub use types::{ConfigError, IniError, InitializationError, RefreshError, StoreError};
