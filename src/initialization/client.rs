//! HTTP client initialization.

use std::time::Duration;

use reqwest::ClientBuilder;

/// User-Agent sent with refresh requests.
const CLIENT_USER_AGENT: &str = concat!("uas_parser/", env!("CARGO_PKG_VERSION"));

/// Initializes an HTTP client for database downloads.
///
/// Creates a `reqwest::Client` configured with:
/// - The crate's own User-Agent header
/// - The given per-request timeout
/// - Transparent gzip decoding (and `Accept-Encoding: gzip`) when `gzip` is set
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(timeout: Duration, gzip: bool) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(CLIENT_USER_AGENT)
        .gzip(gzip)
        .build()
}
