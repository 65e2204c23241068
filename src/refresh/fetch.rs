//! Remote fetching.
//!
//! A fetch yields the response body, or an empty body on any failure
//! (transport error, timeout, non-success status). Callers treat empty as
//! "nothing fetched".

use std::future::Future;
use std::time::Duration;

use url::Url;

use crate::initialization::init_client;

/// Per-refresh transport settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Per-request timeout
    pub timeout: Duration,
    /// Request gzip-compressed transfer
    pub gzip: bool,
}

/// Something that can retrieve a URL's body.
pub trait Fetch: Send + Sync {
    /// Fetches `url`. Returns an empty body on failure.
    fn fetch(&self, url: &Url, options: &FetchOptions) -> impl Future<Output = Vec<u8>> + Send;
}

/// [`Fetch`] over HTTP(S) using `reqwest`.
///
/// Both clients are built once and shared by every fetch, so the requests of
/// one refresh reuse connections. The per-request timeout comes from
/// [`FetchOptions`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    plain: reqwest::Client,
    compressed: reqwest::Client,
}

impl HttpFetcher {
    /// Builds the fetcher's clients with `timeout` as their default timeout.
    ///
    /// # Errors
    ///
    /// Returns a `reqwest::Error` if client creation fails.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            plain: init_client(timeout, false)?,
            compressed: init_client(timeout, true)?,
        })
    }

    fn client(&self, gzip: bool) -> &reqwest::Client {
        if gzip {
            &self.compressed
        } else {
            &self.plain
        }
    }

    async fn try_fetch(&self, url: &Url, options: &FetchOptions) -> Result<Vec<u8>, reqwest::Error> {
        let response = self
            .client(options.gzip)
            .get(url.clone())
            .timeout(options.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url, options: &FetchOptions) -> Vec<u8> {
        match self.try_fetch(url, options).await {
            Ok(body) => {
                log::debug!("Fetched {} bytes from {}", body.len(), url);
                body
            }
            Err(e) => {
                log::debug!("Failed to fetch {}: {}", url, e);
                Vec::new()
            }
        }
    }
}
