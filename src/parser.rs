//! The user agent parser.
//!
//! [`UasParser`] owns the configuration, the cache directory and the current
//! signature store. The store is loaded lazily on the first classification,
//! refreshed from the remote source when the cache is stale, and swapped
//! wholesale so concurrent classifications always see one complete store.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use url::Url;

use crate::cache::{assess, CacheLayout};
use crate::classify::{classify, ClassificationResult};
use crate::config::{Config, AMBIENT_USER_AGENT_ENV, UNKNOWN_VERSION};
use crate::error_handling::{ConfigError, RefreshError};
use crate::refresh::{refresh, Fetch, FetchOptions, HttpFetcher, RefreshOutcome, RefreshSources};
use crate::store::SignatureStore;
use crate::utils::now_unix;

/// Where the user agent comes from when none is passed to [`UasParser::classify`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AmbientUserAgent {
    /// The `HTTP_USER_AGENT` environment variable (CGI convention)
    #[default]
    Environment,
    /// A fixed value
    Fixed(String),
    /// No fallback
    Disabled,
}

impl AmbientUserAgent {
    fn resolve(&self) -> Option<String> {
        match self {
            AmbientUserAgent::Environment => std::env::var(AMBIENT_USER_AGENT_ENV).ok(),
            AmbientUserAgent::Fixed(value) => Some(value.clone()),
            AmbientUserAgent::Disabled => None,
        }
    }
}

/// The store generation currently in use.
#[derive(Debug)]
struct LoadedStore {
    store: Option<Arc<SignatureStore>>,
    checked_at: i64,
}

/// Classifies user agent strings against a cached signature database.
///
/// # Examples
///
/// ```no_run
/// use uas_parser::{Config, UasParser};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let parser = UasParser::new(Config {
///     cache_dir: Some(std::env::temp_dir().join("uas_parser")),
///     ..Default::default()
/// })?;
///
/// let result = parser
///     .classify(Some("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_8_3) Safari/536.29.13"))
///     .await;
/// println!("{} on {}", result.ua_name, result.os_name);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct UasParser<F: Fetch = HttpFetcher> {
    config: Config,
    cache: Option<CacheLayout>,
    fetcher: F,
    ambient: AmbientUserAgent,
    loaded: RwLock<Option<LoadedStore>>,
    refresh_lock: Mutex<()>,
}

impl UasParser<HttpFetcher> {
    /// Creates a parser that downloads over HTTP.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the configuration is invalid, the cache
    /// directory is unusable or the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let fetcher = HttpFetcher::new(config.timeout).map_err(ConfigError::HttpClient)?;
        Self::with_fetcher(config, fetcher)
    }
}

impl<F: Fetch> UasParser<F> {
    /// Creates a parser that downloads through `fetcher`.
    ///
    /// # Errors
    ///
    /// See [`UasParser::new`].
    pub fn with_fetcher(config: Config, fetcher: F) -> Result<Self, ConfigError> {
        config.validate()?;
        let cache = config
            .cache_dir
            .as_deref()
            .map(CacheLayout::prepare)
            .transpose()?;
        Ok(Self {
            config,
            cache,
            fetcher,
            ambient: AmbientUserAgent::default(),
            loaded: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Replaces the ambient user agent source. `None` disables the fallback.
    pub fn with_ambient_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.ambient = match user_agent {
            Some(value) => AmbientUserAgent::Fixed(value),
            None => AmbientUserAgent::Disabled,
        };
        self
    }

    /// Classifies `user_agent`, or the ambient user agent when it is absent or empty.
    ///
    /// Never fails: without a usable database every field reads `"unknown"`.
    pub async fn classify(&self, user_agent: Option<&str>) -> ClassificationResult {
        let ambient;
        let candidate = match user_agent.filter(|ua| !ua.is_empty()) {
            Some(ua) => ua,
            None => {
                ambient = self.ambient.resolve();
                match ambient.as_deref().filter(|ua| !ua.is_empty()) {
                    Some(ua) => ua,
                    None => return ClassificationResult::default(),
                }
            }
        };

        match self.signature_store().await {
            Some(store) => classify(&store, candidate, self.config.info_url.as_str()),
            None => ClassificationResult::default(),
        }
    }

    /// The current signature store, loading or refreshing it first when due.
    pub async fn signature_store(&self) -> Option<Arc<SignatureStore>> {
        {
            let loaded = self.loaded.read().await;
            if let Some(current) = loaded.as_ref() {
                if !self.recheck_due(current.checked_at) {
                    return current.store.clone();
                }
            }
        }
        self.load().await
    }

    fn recheck_due(&self, checked_at: i64) -> bool {
        let interval = i64::try_from(self.config.update_interval.as_secs()).unwrap_or(i64::MAX);
        now_unix().saturating_sub(checked_at) > interval
    }

    async fn load(&self) -> Option<Arc<SignatureStore>> {
        let _guard = match self.refresh_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                // A refresh is in flight: keep serving the current store if there is one
                if let Some(store) = self.current_store().await {
                    log::trace!("Refresh in progress, using the loaded store");
                    return Some(store);
                }
                self.refresh_lock.lock().await
            }
        };

        // Another task may have loaded while we waited for the lock
        if let Some(current) = self.loaded.read().await.as_ref() {
            if !self.recheck_due(current.checked_at) {
                return current.store.clone();
            }
        }

        let Some(cache) = &self.cache else {
            log::debug!("No cache directory configured, no signature data available");
            return None;
        };

        let now = now_unix();
        let manifest = cache.read_manifest().await;
        let freshness = assess(
            manifest.as_ref(),
            cache.database_exists().await,
            self.config.update_interval,
            now,
        );
        log::debug!("Signature cache state: {:?}", freshness);
        if freshness.needs_refresh(self.config.do_downloads) {
            self.run_refresh(cache, false, now).await;
        }

        let fresh = self.read_store(cache).await;
        let mut loaded = self.loaded.write().await;
        let store = match (fresh, loaded.take()) {
            (Some(store), _) => Some(store),
            (None, previous) => previous.and_then(|p| p.store),
        };
        *loaded = Some(LoadedStore {
            store: store.clone(),
            checked_at: now_unix(),
        });
        store
    }

    async fn current_store(&self) -> Option<Arc<SignatureStore>> {
        self.loaded.read().await.as_ref()?.store.clone()
    }

    async fn read_store(&self, cache: &CacheLayout) -> Option<Arc<SignatureStore>> {
        let bytes = match cache.read_database().await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::debug!(
                    "Failed to read {}: {}",
                    cache.database_path().display(),
                    e
                );
                return None;
            }
        };
        match SignatureStore::from_bytes(&bytes) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                log::warn!("Ignoring unusable signature database: {}", e);
                None
            }
        }
    }

    async fn run_refresh(&self, cache: &CacheLayout, force: bool, now: i64) -> RefreshOutcome {
        let sources = RefreshSources {
            ver_url: &self.config.ver_url,
            ini_url: &self.config.ini_url,
            md5_url: &self.config.md5_url,
        };
        let options = FetchOptions {
            timeout: self.config.timeout,
            gzip: self.config.use_zip_downloads,
        };
        refresh(&self.fetcher, cache, sources, &options, force, now).await
    }

    /// Refreshes the cached database from the remote source now.
    ///
    /// Unless `force` is set, nothing is downloaded when the cached version is
    /// current. On success the new database replaces the in-memory store.
    /// Returns whether the cache holds a verified database afterwards.
    pub async fn download_data(&self, force: bool) -> bool {
        self.try_download_data(force).await.is_success()
    }

    /// Like [`UasParser::download_data`], reporting what happened.
    pub async fn try_download_data(&self, force: bool) -> RefreshOutcome {
        let Some(cache) = &self.cache else {
            return RefreshOutcome::Failed {
                version: UNKNOWN_VERSION.to_string(),
                error: RefreshError::NoCacheDir,
            };
        };

        let _guard = self.refresh_lock.lock().await;
        let now = now_unix();
        let outcome = self.run_refresh(cache, force, now).await;
        if outcome.is_success() {
            if let Some(store) = self.read_store(cache).await {
                *self.loaded.write().await = Some(LoadedStore {
                    store: Some(store),
                    checked_at: now_unix(),
                });
            }
        }
        outcome
    }

    /// Deletes the cached manifest and database. Returns whether both are gone.
    pub async fn clear_cache(&self) -> bool {
        let Some(cache) = &self.cache else {
            return true;
        };
        let _guard = self.refresh_lock.lock().await;
        match cache.clear().await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to clear cache {}: {}", cache.dir().display(), e);
                false
            }
        }
    }

    /// Drops the in-memory store; the next classification loads it again.
    pub async fn clear_data(&self) {
        *self.loaded.write().await = None;
    }

    /// Sets the cache directory, creating it if needed.
    ///
    /// Returns `false` and keeps the previous directory when `dir` cannot be
    /// created, is not a directory, or is not writable.
    pub fn set_cache_dir(&mut self, dir: impl AsRef<Path>) -> bool {
        let dir = dir.as_ref();
        match CacheLayout::prepare(dir) {
            Ok(layout) => {
                self.config.cache_dir = Some(layout.dir().to_path_buf());
                self.cache = Some(layout);
                *self.loaded.get_mut() = None;
                true
            }
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }

    /// The cache directory, if one is configured.
    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache.as_ref().map(CacheLayout::dir)
    }

    /// Sets the database URL. Malformed URLs are rejected and the prior value kept.
    pub fn set_ini_url(&mut self, url: &str) -> bool {
        replace_url(&mut self.config.ini_url, url)
    }

    /// Sets the version tag URL. Malformed URLs are rejected and the prior value kept.
    pub fn set_ver_url(&mut self, url: &str) -> bool {
        replace_url(&mut self.config.ver_url, url)
    }

    /// Sets the checksum URL. Malformed URLs are rejected and the prior value kept.
    pub fn set_md5_url(&mut self, url: &str) -> bool {
        replace_url(&mut self.config.md5_url, url)
    }

    /// Sets the info base URL. Malformed URLs are rejected and the prior value kept.
    pub fn set_info_url(&mut self, url: &str) -> bool {
        replace_url(&mut self.config.info_url, url)
    }

    /// Enables or disables downloads. Data is still downloaded when none exists.
    pub fn set_do_downloads(&mut self, enabled: bool) {
        self.config.do_downloads = enabled;
    }

    /// Whether downloads are enabled.
    pub fn do_downloads(&self) -> bool {
        self.config.do_downloads
    }

    /// Enables or disables gzip transfer.
    pub fn set_use_zip_downloads(&mut self, enabled: bool) {
        self.config.use_zip_downloads = enabled;
    }

    /// Whether gzip transfer is requested.
    pub fn use_zip_downloads(&self) -> bool {
        self.config.use_zip_downloads
    }

    /// Sets the update interval. A zero interval is rejected.
    pub fn set_update_interval(&mut self, interval: Duration) -> bool {
        if interval.is_zero() {
            return false;
        }
        self.config.update_interval = interval;
        true
    }

    /// The update interval.
    pub fn update_interval(&self) -> Duration {
        self.config.update_interval
    }

    /// Sets the network timeout. A zero timeout is rejected.
    pub fn set_timeout(&mut self, timeout: Duration) -> bool {
        if timeout.is_zero() {
            return false;
        }
        self.config.timeout = timeout;
        true
    }

    /// The network timeout.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// The effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

fn replace_url(slot: &mut Url, url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            *slot = parsed;
            true
        }
        Err(source) => {
            log::debug!(
                "{}",
                ConfigError::InvalidUrl {
                    url: url.to_string(),
                    source,
                }
            );
            false
        }
    }
}
