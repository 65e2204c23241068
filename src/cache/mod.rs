//! Cache directory management.
//!
//! The cache directory holds two files:
//! - `cache.ini`: the manifest (local version, last update time and status)
//! - `uasdata.ini`: the signature database
//!
//! Files are replaced atomically (temporary file in the same directory, then
//! rename), so readers never see a half-written database.

mod freshness;
mod manifest;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::config::{DATABASE_FILE, MANIFEST_FILE};
use crate::error_handling::ConfigError;

pub use freshness::{assess, Freshness, StaleReason};
pub use manifest::CacheManifest;

/// A validated, writable cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    dir: PathBuf,
}

impl CacheLayout {
    /// Creates `dir` if needed and checks that it is a writable directory.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the directory cannot be created, is not a
    /// directory, or does not accept new files.
    pub fn prepare(dir: &Path) -> Result<Self, ConfigError> {
        if dir.exists() && !dir.is_dir() {
            return Err(ConfigError::CacheDirNotDirectory(dir.to_path_buf()));
        }
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::CacheDirCreate {
            path: dir.to_path_buf(),
            source,
        })?;
        if !dir.is_dir() {
            return Err(ConfigError::CacheDirNotDirectory(dir.to_path_buf()));
        }
        tempfile::tempfile_in(dir).map_err(|source| ConfigError::CacheDirNotWritable {
            path: dir.to_path_buf(),
            source,
        })?;

        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        log::debug!("Using cache directory {}", dir.display());
        Ok(Self { dir })
    }

    /// The cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Path of the database file.
    pub fn database_path(&self) -> PathBuf {
        self.dir.join(DATABASE_FILE)
    }

    /// Whether the database file exists.
    pub async fn database_exists(&self) -> bool {
        fs::try_exists(self.database_path()).await.unwrap_or(false)
    }

    /// Reads the manifest. `None` when it is missing or unreadable.
    pub async fn read_manifest(&self) -> Option<CacheManifest> {
        let text = fs::read_to_string(self.manifest_path()).await.ok()?;
        CacheManifest::parse(&text)
    }

    /// Replaces the manifest.
    pub async fn write_manifest(&self, manifest: &CacheManifest) -> io::Result<()> {
        write_atomic(&self.dir, self.manifest_path(), manifest.render().into_bytes()).await
    }

    /// Reads the raw database bytes.
    pub async fn read_database(&self) -> io::Result<Vec<u8>> {
        fs::read(self.database_path()).await
    }

    /// Replaces the database file.
    ///
    /// # Errors
    ///
    /// Fails with `PermissionDenied` when the existing file is read-only; the
    /// file is left as it was.
    pub async fn write_database(&self, bytes: Vec<u8>) -> io::Result<()> {
        write_atomic(&self.dir, self.database_path(), bytes).await
    }

    /// Deletes the manifest and the database. Missing files are not an error.
    pub async fn clear(&self) -> io::Result<()> {
        for path in [self.manifest_path(), self.database_path()] {
            match fs::remove_file(&path).await {
                Ok(()) => log::debug!("Removed {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

async fn write_atomic(dir: &Path, target: PathBuf, bytes: Vec<u8>) -> io::Result<()> {
    match fs::metadata(&target).await {
        Ok(meta) if meta.permissions().readonly() => {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is read-only", target.display()),
            ));
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || -> io::Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(io::Error::other)?
}
