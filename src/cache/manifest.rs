//! The `cache.ini` manifest.
//!
//! ```text
//! ; cache info for class UASparser - http://user-agent-string.info/download/UASparser
//! [main]
//! localversion = "20130529-01"
//! lastupdate = "1369836000"
//! lastupdatestatus = "1"
//! ```

use crate::ini::{IniDocument, IniWriter};

const SECTION: &str = "main";
const HEADER: &str = "cache info for class UASparser - http://user-agent-string.info/download/UASparser";

/// Record of the last refresh attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheManifest {
    /// Version of the cached database, or `"none"`
    pub local_version: String,
    /// Unix time of the last refresh attempt
    pub last_update: i64,
    /// Whether the last refresh attempt succeeded
    pub last_update_ok: bool,
}

impl CacheManifest {
    /// Parses manifest text.
    ///
    /// Returns `None` when the text is not a manifest or has no `lastupdate`.
    /// A status other than `"1"` reads as a failed refresh.
    pub fn parse(text: &str) -> Option<Self> {
        let doc = match IniDocument::parse(text) {
            Ok(doc) => doc,
            Err(e) => {
                log::debug!("Ignoring unreadable cache manifest: {}", e);
                return None;
            }
        };
        let last_update = doc.value(SECTION, "lastupdate")?.trim().parse().ok()?;
        Some(Self {
            local_version: doc
                .value(SECTION, "localversion")
                .unwrap_or_default()
                .to_string(),
            last_update,
            last_update_ok: doc.value(SECTION, "lastupdatestatus").map(str::trim) == Some("1"),
        })
    }

    /// Renders the manifest text.
    pub fn render(&self) -> String {
        IniWriter::new()
            .comment(HEADER)
            .section(SECTION)
            .entry("localversion", &self.local_version)
            .entry("lastupdate", &self.last_update.to_string())
            .entry("lastupdatestatus", if self.last_update_ok { "1" } else { "0" })
            .finish()
    }
}
