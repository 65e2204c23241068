//! Refresh Orchestrator.
//!
//! One refresh attempt runs three fetches in order:
//! 1. The remote version tag (`YYYYMMDD-NN`)
//! 2. The database body
//! 3. The body's MD5 checksum
//!
//! The body only replaces the cached database after it hashes to the published
//! checksum. Whatever happens, the manifest is rewritten to record the attempt.

mod fetch;

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::cache::{CacheLayout, CacheManifest};
use crate::config::UNKNOWN_VERSION;
use crate::error_handling::RefreshError;
use crate::utils::compile_regex_unsafe;

pub use fetch::{Fetch, FetchOptions, HttpFetcher};

static VERSION_TAG: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(r"^[0-9]{8}-[0-9]{2}$", "VERSION_TAG"));

/// Remote endpoints of one refresh.
#[derive(Debug, Clone, Copy)]
pub struct RefreshSources<'a> {
    /// Version tag URL
    pub ver_url: &'a Url,
    /// Database URL
    pub ini_url: &'a Url,
    /// Checksum URL
    pub md5_url: &'a Url,
}

/// Result of a refresh attempt.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The cached database is already the remote version; nothing was downloaded.
    Current {
        /// Cached version
        version: String,
    },
    /// A new database was verified and stored.
    Updated {
        /// Version reported by the server, or `"none"`
        version: String,
    },
    /// The attempt failed; the cached database is unchanged.
    Failed {
        /// Version recorded in the manifest
        version: String,
        /// What went wrong
        error: RefreshError,
    },
}

impl RefreshOutcome {
    /// Whether the cache now holds a verified database.
    pub fn is_success(&self) -> bool {
        !matches!(self, RefreshOutcome::Failed { .. })
    }

    /// The version recorded in the manifest.
    pub fn version(&self) -> &str {
        match self {
            RefreshOutcome::Current { version }
            | RefreshOutcome::Updated { version }
            | RefreshOutcome::Failed { version, .. } => version,
        }
    }
}

/// Whether `tag` is a well-formed version tag.
pub fn is_version_tag(tag: &str) -> bool {
    VERSION_TAG.is_match(tag)
}

/// Runs one refresh attempt against `layout` at time `now`.
///
/// Unless `force` is set, the download is skipped when the server's version is
/// not newer than the cached one and the database file exists.
pub async fn refresh<F: Fetch>(
    fetcher: &F,
    layout: &CacheLayout,
    sources: RefreshSources<'_>,
    options: &FetchOptions,
    force: bool,
    now: i64,
) -> RefreshOutcome {
    let previous = layout.read_manifest().await;
    let local_version = previous
        .as_ref()
        .map(|m| m.local_version.as_str())
        .filter(|v| is_version_tag(v));

    let remote = fetcher.fetch(sources.ver_url, options).await;
    let remote = String::from_utf8_lossy(&remote).trim().to_string();
    let remote_version = if is_version_tag(&remote) {
        remote
    } else {
        log::debug!("Version string format mismatch: {:?}", remote);
        UNKNOWN_VERSION.to_string()
    };

    if let Some(local) = local_version {
        if remote_version != UNKNOWN_VERSION
            && remote_version.as_str() <= local
            && layout.database_exists().await
        {
            if force {
                log::debug!("Existing file is current, but forcing a download anyway");
            } else {
                log::debug!("Download skipped, existing file {} is current", local);
                let version = local.to_string();
                record(layout, &version, true, now).await;
                return RefreshOutcome::Current { version };
            }
        }
    }

    let outcome = match download(fetcher, layout, sources, options).await {
        Ok(()) => RefreshOutcome::Updated {
            version: remote_version,
        },
        Err(error) => RefreshOutcome::Failed {
            version: local_version.unwrap_or(UNKNOWN_VERSION).to_string(),
            error,
        },
    };
    record(layout, outcome.version(), outcome.is_success(), now).await;

    match &outcome {
        RefreshOutcome::Failed { error, .. } => {
            log::info!("Signature database refresh failed: {}", error)
        }
        _ => log::info!("Signature database updated to {}", outcome.version()),
    }
    outcome
}

async fn download<F: Fetch>(
    fetcher: &F,
    layout: &CacheLayout,
    sources: RefreshSources<'_>,
    options: &FetchOptions,
) -> Result<(), RefreshError> {
    let body = fetcher.fetch(sources.ini_url, options).await;
    if body.is_empty() {
        return Err(RefreshError::EmptyBody);
    }

    let published = fetcher.fetch(sources.md5_url, options).await;
    let published = String::from_utf8_lossy(&published).trim().to_ascii_lowercase();
    if published.is_empty() {
        return Err(RefreshError::EmptyHash);
    }

    let actual = format!("{:x}", md5::compute(&body));
    if actual != published {
        return Err(RefreshError::HashMismatch {
            expected: published,
            actual,
        });
    }

    layout
        .write_database(body)
        .await
        .map_err(RefreshError::Persist)
}

async fn record(layout: &CacheLayout, version: &str, ok: bool, now: i64) {
    let manifest = CacheManifest {
        local_version: version.to_string(),
        last_update: now,
        last_update_ok: ok,
    };
    if let Err(e) = layout.write_manifest(&manifest).await {
        log::warn!(
            "Failed to write cache manifest {}: {}",
            layout.manifest_path().display(),
            e
        );
    }
}
