//! Configuration types and CLI options.
//!
//! This module defines the library configuration struct and the command-line
//! options of the `uas_parser` binary.

use std::path::PathBuf;
use std::time::Duration;

use structopt::StructOpt;
use strum::VariantNames;
use strum_macros::{EnumString, VariantNames as VariantNamesMacro};
use thiserror::Error;
use url::Url;

use crate::config::constants::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_INFO_URL, DEFAULT_INI_URL, DEFAULT_MD5_URL,
    DEFAULT_UPDATE_INTERVAL, DEFAULT_VER_URL,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, EnumString, VariantNamesMacro)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, EnumString, VariantNamesMacro)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// A configuration value that is out of range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {field}: {message}")]
pub struct ConfigValidationError {
    /// Name of the offending field
    pub field: &'static str,
    /// What is wrong with it
    pub message: String,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use uas_parser::Config;
/// use std::path::PathBuf;
/// use std::time::Duration;
///
/// let config = Config {
///     cache_dir: Some(PathBuf::from("/var/cache/uas")),
///     update_interval: Duration::from_secs(7 * 24 * 60 * 60),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the manifest and the database file
    pub cache_dir: Option<PathBuf>,

    /// Allowed age of the cached database
    pub update_interval: Duration,

    /// Per-request network timeout
    pub timeout: Duration,

    /// Whether this instance may download data. Data is still downloaded when
    /// none exists at all.
    pub do_downloads: bool,

    /// Ask the server for gzip-compressed responses
    pub use_zip_downloads: bool,

    /// Full database URL
    pub ini_url: Url,

    /// Version tag URL
    pub ver_url: Url,

    /// Checksum URL
    pub md5_url: Url,

    /// Base URL for `ua_info_url`
    pub info_url: Url,
}

impl Config {
    /// Checks that intervals and timeouts are usable.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.update_interval.is_zero() {
            return Err(ConfigValidationError {
                field: "update_interval",
                message: "must be greater than 0 seconds".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigValidationError {
                field: "timeout",
                message: "must be greater than 0 seconds".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            timeout: DEFAULT_FETCH_TIMEOUT,
            do_downloads: true,
            use_zip_downloads: true,
            ini_url: default_url(DEFAULT_INI_URL),
            ver_url: default_url(DEFAULT_VER_URL),
            md5_url: default_url(DEFAULT_MD5_URL),
            info_url: default_url(DEFAULT_INFO_URL),
        }
    }
}

fn default_url(url: &'static str) -> Url {
    Url::parse(url).unwrap_or_else(|e| {
        panic!(
            "Failed to parse built-in URL '{}': {}. This is a programming error.",
            url, e
        )
    })
}

/// Command-line options for the `uas_parser` binary.
#[derive(Debug, StructOpt)]
#[structopt(
    name = "uas_parser",
    about = "Classify user agent strings against the user-agent-string.info database"
)]
pub struct Opt {
    /// User agent strings to classify. Falls back to $HTTP_USER_AGENT when none are given.
    pub user_agents: Vec<String>,

    /// Cache directory for the manifest and database files
    #[structopt(long, parse(from_os_str))]
    pub cache_dir: Option<PathBuf>,

    /// Allowed age of the cached database, in seconds
    #[structopt(long, default_value = "86400")]
    pub update_interval: u64,

    /// Network timeout per request, in seconds
    #[structopt(long, default_value = "60")]
    pub timeout: u64,

    /// Never download unless no data exists at all
    #[structopt(long)]
    pub no_downloads: bool,

    /// Do not request gzip-compressed transfers
    #[structopt(long)]
    pub no_gzip: bool,

    /// Download the database even if the cached copy is current
    #[structopt(long)]
    pub force_update: bool,

    /// Delete the cached manifest and database before doing anything else
    #[structopt(long)]
    pub clear_cache: bool,

    /// Print results as JSON lines
    #[structopt(long)]
    pub json: bool,

    /// Log level
    #[structopt(long, default_value = "info", possible_values = LogLevel::VARIANTS, case_insensitive = true)]
    pub log_level: LogLevel,

    /// Log format
    #[structopt(long, default_value = "plain", possible_values = LogFormat::VARIANTS, case_insensitive = true)]
    pub log_format: LogFormat,
}

impl Opt {
    /// Builds the library configuration from the parsed options.
    pub fn to_config(&self) -> Config {
        Config {
            cache_dir: self.cache_dir.clone(),
            update_interval: Duration::from_secs(self.update_interval),
            timeout: Duration::from_secs(self.timeout),
            do_downloads: !self.no_downloads,
            use_zip_downloads: !self.no_gzip,
            ..Default::default()
        }
    }
}
