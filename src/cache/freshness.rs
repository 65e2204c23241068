//! Freshness Controller.
//!
//! Decides from the manifest whether the cached database can be used as-is.

use std::time::Duration;

use strum_macros::Display;

use crate::cache::manifest::CacheManifest;

/// Why a cached database needs refreshing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum StaleReason {
    /// The last refresh attempt failed
    LastUpdateFailed,
    /// The last refresh is older than the update interval
    Expired,
}

/// State of the cached database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No manifest or no database file; a download is needed even when
    /// downloads are disabled.
    Absent,
    /// Usable, but a refresh should be attempted if downloads are enabled.
    Stale(StaleReason),
    /// Usable as-is.
    Fresh,
}

impl Freshness {
    /// Whether a refresh is needed given the download setting.
    pub fn needs_refresh(self, do_downloads: bool) -> bool {
        match self {
            Freshness::Absent => true,
            Freshness::Stale(_) => do_downloads,
            Freshness::Fresh => false,
        }
    }
}

/// Classifies the cache at time `now` (Unix seconds).
///
/// Stale means the last attempt failed or `now - last_update` exceeds
/// `interval`. Exactly `interval` seconds old is still fresh.
pub fn assess(
    manifest: Option<&CacheManifest>,
    database_present: bool,
    interval: Duration,
    now: i64,
) -> Freshness {
    let Some(manifest) = manifest else {
        return Freshness::Absent;
    };
    if !database_present {
        return Freshness::Absent;
    }
    if !manifest.last_update_ok {
        return Freshness::Stale(StaleReason::LastUpdateFailed);
    }
    let interval = i64::try_from(interval.as_secs()).unwrap_or(i64::MAX);
    if now.saturating_sub(manifest.last_update) > interval {
        return Freshness::Stale(StaleReason::Expired);
    }
    Freshness::Fresh
}
