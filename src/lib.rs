//! uas_parser library: user agent classification against a cached signature database
//!
//! This library identifies the browser (or robot) and operating system behind a
//! user agent string using the user-agent-string.info signature database. The
//! database is cached on disk, refreshed from the remote source once it is
//! older than the configured interval, and verified by checksum before use.
//!
//! # Example
//!
//! ```no_run
//! use uas_parser::{Config, UasParser};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     cache_dir: Some(std::path::PathBuf::from("/var/cache/uas_parser")),
//!     ..Default::default()
//! };
//!
//! let parser = UasParser::new(config)?;
//! let result = parser
//!     .classify(Some("Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)"))
//!     .await;
//! println!("{}: {} on {}", result.kind, result.ua_name, result.os_name);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod cache;
pub mod classify;
pub mod config;
mod error_handling;
pub mod ini;
pub mod initialization;
mod parser;
pub mod refresh;
pub mod store;
mod utils;

// Re-export public API
pub use classify::{classify, classify_traced, ClassificationResult, Resolution};
pub use config::{Config, ConfigValidationError, LogFormat, LogLevel, Opt};
pub use error_handling::{ConfigError, IniError, InitializationError, RefreshError, StoreError};
pub use parser::{AmbientUserAgent, UasParser};
pub use refresh::{Fetch, FetchOptions, HttpFetcher, RefreshOutcome};
pub use store::SignatureStore;
