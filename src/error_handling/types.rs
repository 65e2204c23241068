//! Error type definitions.
//!
//! This module defines all error types used throughout the crate. None of them
//! is fatal: the worst observable outcome of any of them is a classification
//! where every field reads `"unknown"`.

use std::io;
use std::path::PathBuf;

use log::SetLoggerError;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Configuration errors, reported synchronously to whoever issued the setting.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The cache directory did not exist and could not be created.
    #[error("Cache directory {path:?} could not be created: {source}")]
    CacheDirCreate {
        /// Requested directory
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The cache path exists but is not a directory.
    #[error("Cache path {0:?} is not a directory")]
    CacheDirNotDirectory(PathBuf),

    /// The cache directory exists but files cannot be created in it.
    #[error("Cache directory {path:?} is not writable: {source}")]
    CacheDirNotWritable {
        /// Requested directory
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// A source URL could not be parsed.
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The rejected input
        url: String,
        /// Parser error
        source: url::ParseError,
    },

    /// A configuration value is out of range.
    #[error(transparent)]
    Validation(#[from] ConfigValidationError),

    /// The HTTP client for downloads could not be built.
    #[error("HTTP client initialization error: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Syntax error in a section-oriented flat file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct IniError {
    /// 1-based line number
    pub line: usize,
    /// What was wrong with the line
    pub message: String,
}

/// Reasons a signature database could not be turned into a usable store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The source bytes were absent or empty.
    #[error("Signature database is empty")]
    Empty,

    /// The source text is not a well-formed section file.
    #[error("Signature database is malformed: {0}")]
    Syntax(#[from] IniError),

    /// A section the classifier relies on is missing.
    #[error("Signature database has no [{0}] section")]
    MissingSection(&'static str),
}

/// Reasons a refresh attempt failed.
///
/// Every variant leaves the previously cached database untouched.
#[derive(Error, Debug)]
pub enum RefreshError {
    /// No cache directory is configured, so there is nowhere to store data.
    #[error("No cache directory configured")]
    NoCacheDir,

    /// The database body could not be fetched or was empty.
    #[error("Failed to fetch data file")]
    EmptyBody,

    /// The checksum could not be fetched or was empty.
    #[error("Failed to fetch hash file")]
    EmptyHash,

    /// The body does not hash to the published checksum.
    #[error("Data file hash mismatch (expected {expected}, got {actual})")]
    HashMismatch {
        /// Checksum published by the server
        expected: String,
        /// Checksum of the downloaded body
        actual: String,
    },

    /// The verified body could not be written to the cache directory.
    #[error("Failed to write data file: {0}")]
    Persist(#[source] io::Error),
}
