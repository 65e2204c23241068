//! Process-level setup: the logger for the binary and the HTTP client used
//! by refreshes.
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
