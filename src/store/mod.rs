//! Signature Store: the in-memory form of the signature database.
//!
//! This module handles:
//! - Building typed tables from the section file (robots, browsers, browser
//!   types, browser-to-OS links, operating systems)
//! - Keeping the browser and OS signature lists in file order
//! - First-match-wins lookups over those lists
//!
//! A store is immutable once built. A refresh builds a new one and swaps it in.

mod models;
mod pattern;

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::error_handling::StoreError;
use crate::ini::{IniDocument, IniSection};

pub use models::{BrowserProfile, BrowserType, OsProfile, ProfileId, Robot, Signature};
pub use pattern::{Matcher, Pattern, PatternError, PatternMatch};

/// Sections every database must contain (they may be empty).
pub const REQUIRED_SECTIONS: &[&str] = &[
    "robots",
    "os",
    "browser",
    "browser_type",
    "browser_reg",
    "browser_os",
    "os_reg",
];

/// A browser signature hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserMatch<'t> {
    /// Matched browser profile
    pub profile_id: ProfileId,
    /// Version captured by the pattern
    pub version: Option<&'t str>,
}

/// Parsed signature database.
#[derive(Debug, Clone, Default)]
pub struct SignatureStore {
    version: Option<String>,
    robots: IndexMap<String, Robot>,
    browser_signatures: Vec<Signature>,
    browsers: HashMap<ProfileId, BrowserProfile>,
    browser_types: HashMap<ProfileId, BrowserType>,
    browser_os: HashMap<ProfileId, ProfileId>,
    os_signatures: Vec<Signature>,
    operating_systems: HashMap<ProfileId, OsProfile>,
}

impl SignatureStore {
    /// Starts an empty store for programmatic construction.
    pub fn builder() -> SignatureStoreBuilder {
        SignatureStoreBuilder::default()
    }

    /// Builds a store from raw database bytes.
    ///
    /// # Errors
    ///
    /// `StoreError::Empty` for empty input, `StoreError::Syntax` when the text
    /// is not a section file and `StoreError::MissingSection` when one of
    /// [`REQUIRED_SECTIONS`] is absent.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(StoreError::Empty);
        }
        Self::from_text(&String::from_utf8_lossy(bytes))
    }

    /// Builds a store from database text. See [`SignatureStore::from_bytes`].
    pub fn from_text(text: &str) -> Result<Self, StoreError> {
        if text.trim().is_empty() {
            return Err(StoreError::Empty);
        }
        let doc = IniDocument::parse(text)?;
        Self::from_document(&doc)
    }

    fn from_document(doc: &IniDocument) -> Result<Self, StoreError> {
        let section = |name: &'static str| required(doc, name);
        for name in REQUIRED_SECTIONS {
            section(*name)?;
        }

        let mut builder = SignatureStore::builder();
        if let Some(version) = doc.version() {
            builder = builder.version(version);
        }

        let mut rejected = 0usize;
        for row in section("robots")?.values() {
            match Robot::from_row(row) {
                Some(robot) => builder = builder.robot(robot),
                None => rejected += 1,
            }
        }
        for (key, row) in section("browser")? {
            match key.parse() {
                Ok(id) => builder = builder.browser(id, BrowserProfile::from_row(row)),
                Err(_) => rejected += 1,
            }
        }
        for (key, row) in section("browser_type")? {
            match key.parse() {
                Ok(id) => builder = builder.browser_type(id, BrowserType::from_row(row)),
                Err(_) => rejected += 1,
            }
        }
        for (key, row) in section("browser_os")? {
            match (key.parse(), models::id(row, 0)) {
                (Ok(browser_id), Some(os_id)) => builder = builder.browser_os(browser_id, os_id),
                _ => rejected += 1,
            }
        }
        for (key, row) in section("os")? {
            match key.parse() {
                Ok(id) => builder = builder.os(id, OsProfile::from_row(row)),
                Err(_) => rejected += 1,
            }
        }
        for row in section("browser_reg")?.values() {
            match signature_row(row) {
                Some((pattern, id)) => builder = builder.browser_signature(pattern, id),
                None => rejected += 1,
            }
        }
        for row in section("os_reg")?.values() {
            match signature_row(row) {
                Some((pattern, id)) => builder = builder.os_signature(pattern, id),
                None => rejected += 1,
            }
        }

        let store = builder.build();
        if rejected > 0 {
            log::debug!("Skipped {} malformed database rows", rejected);
        }
        log::debug!(
            "Loaded signature database {}: {} robots, {} browser signatures, {} OS signatures",
            store.version().unwrap_or("(unversioned)"),
            store.robots.len(),
            store.browser_signatures.len(),
            store.os_signatures.len()
        );
        Ok(store)
    }

    /// Version from the database header, if any.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Robot whose user agent equals `candidate` exactly.
    pub fn robot(&self, candidate: &str) -> Option<&Robot> {
        self.robots.get(candidate)
    }

    /// Browser profile by id.
    pub fn browser(&self, id: ProfileId) -> Option<&BrowserProfile> {
        self.browsers.get(&id)
    }

    /// Browser category by id.
    pub fn browser_type(&self, id: ProfileId) -> Option<&BrowserType> {
        self.browser_types.get(&id)
    }

    /// OS a browser profile is tied to, if any.
    pub fn linked_os(&self, browser_id: ProfileId) -> Option<ProfileId> {
        self.browser_os.get(&browser_id).copied()
    }

    /// OS profile by id.
    pub fn os(&self, id: ProfileId) -> Option<&OsProfile> {
        self.operating_systems.get(&id)
    }

    /// Browser signatures in priority order.
    pub fn browser_signatures(&self) -> &[Signature] {
        &self.browser_signatures
    }

    /// OS signatures in priority order.
    pub fn os_signatures(&self) -> &[Signature] {
        &self.os_signatures
    }

    /// Number of robots.
    pub fn robot_count(&self) -> usize {
        self.robots.len()
    }

    /// First browser signature matching `candidate`.
    pub fn match_browser<'t>(&self, candidate: &'t str) -> Option<BrowserMatch<'t>> {
        first_match(scan(&self.browser_signatures), candidate).map(|(profile_id, found)| BrowserMatch {
            profile_id,
            version: found.version,
        })
    }

    /// First OS signature matching `candidate`.
    pub fn match_os(&self, candidate: &str) -> Option<ProfileId> {
        first_match(scan(&self.os_signatures), candidate).map(|(profile_id, _)| profile_id)
    }
}

/// Scans `signatures` in order and stops at the first hit.
///
/// Patterns that fail to evaluate count as misses.
pub fn first_match<'t, M: Matcher>(
    signatures: impl IntoIterator<Item = (M, ProfileId)>,
    candidate: &'t str,
) -> Option<(ProfileId, PatternMatch<'t>)> {
    signatures
        .into_iter()
        .find_map(|(matcher, id)| matcher.matches(candidate).map(|found| (id, found)))
}

fn scan(signatures: &[Signature]) -> impl Iterator<Item = (&Pattern, ProfileId)> {
    signatures.iter().map(|s| (&s.pattern, s.profile_id))
}

fn required<'d>(doc: &'d IniDocument, name: &'static str) -> Result<&'d IniSection, StoreError> {
    doc.section(name).ok_or(StoreError::MissingSection(name))
}

impl<M: Matcher + ?Sized> Matcher for &M {
    fn try_match<'t>(&self, candidate: &'t str) -> Result<Option<PatternMatch<'t>>, PatternError> {
        (**self).try_match(candidate)
    }
}

fn signature_row(row: &[String]) -> Option<(&str, ProfileId)> {
    let pattern = row.first().filter(|p| !p.is_empty())?;
    Some((pattern.as_str(), models::id(row, 1)?))
}

/// Incremental construction of a [`SignatureStore`].
///
/// Signatures keep the order they are added in. The first robot added for a
/// given user agent wins.
#[derive(Debug, Default)]
pub struct SignatureStoreBuilder {
    store: SignatureStore,
}

impl SignatureStoreBuilder {
    /// Sets the database version.
    pub fn version(mut self, version: &str) -> Self {
        self.store.version = Some(version.to_string());
        self
    }

    /// Adds a robot.
    pub fn robot(mut self, robot: Robot) -> Self {
        self.store
            .robots
            .entry(robot.user_agent.clone())
            .or_insert(robot);
        self
    }

    /// Appends a browser signature.
    pub fn browser_signature(mut self, pattern: &str, profile_id: ProfileId) -> Self {
        self.store
            .browser_signatures
            .push(Signature::new(pattern, profile_id));
        self
    }

    /// Adds a browser profile.
    pub fn browser(mut self, id: ProfileId, profile: BrowserProfile) -> Self {
        self.store.browsers.insert(id, profile);
        self
    }

    /// Adds a browser category.
    pub fn browser_type(mut self, id: ProfileId, browser_type: BrowserType) -> Self {
        self.store.browser_types.insert(id, browser_type);
        self
    }

    /// Ties a browser profile to an OS profile.
    pub fn browser_os(mut self, browser_id: ProfileId, os_id: ProfileId) -> Self {
        self.store.browser_os.insert(browser_id, os_id);
        self
    }

    /// Appends an OS signature.
    pub fn os_signature(mut self, pattern: &str, os_id: ProfileId) -> Self {
        self.store.os_signatures.push(Signature::new(pattern, os_id));
        self
    }

    /// Adds an OS profile.
    pub fn os(mut self, id: ProfileId, profile: OsProfile) -> Self {
        self.store.operating_systems.insert(id, profile);
        self
    }

    /// Finishes the store.
    pub fn build(self) -> SignatureStore {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"; Data (format ini) for UASparser - http://user-agent-string.info
; Version: 20130529-01
[robots]
1[] = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)"
1[] = "Googlebot"
1[] = "Googlebot/2.1"
1[] = ""
1[] = "Google Inc."
1[] = "http://www.google.com/"
1[] = "bot_googlebot.png"
1[] = ""
1[] = "/list-of-ua/bot-detail?bot=Googlebot"
[os]
44[] = "OS X"
44[] = "OS X 10.8 Mountain Lion"
[browser]
5[] = "1"
5[] = "Safari"
[browser_type]
1[] = "Browser"
[browser_reg]
1[] = "/safari\/([0-9.]+)/si"
1[] = "5"
[browser_os]
[os_reg]
1[] = "/mac os x 10.8/si"
1[] = "44"
"#;

    #[test]
    fn test_from_text_builds_tables() {
        let store = SignatureStore::from_text(SAMPLE).unwrap();
        assert_eq!(store.version(), Some("20130529-01"));
        assert_eq!(store.robot_count(), 1);
        assert!(store
            .robot("Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)")
            .is_some());
        assert_eq!(store.browser(5).unwrap().family.as_deref(), Some("Safari"));
        assert_eq!(
            store.browser_type(1).unwrap().label.as_deref(),
            Some("Browser")
        );
        assert_eq!(store.os(44).unwrap().family.as_deref(), Some("OS X"));
        assert_eq!(store.browser_signatures().len(), 1);
        assert_eq!(store.os_signatures().len(), 1);
        assert_eq!(store.linked_os(5), None);
    }

    #[test]
    fn test_robot_lookup_is_exact() {
        let store = SignatureStore::from_text(SAMPLE).unwrap();
        assert!(store.robot("Googlebot").is_none());
        assert!(store
            .robot("mozilla/5.0 (compatible; googlebot/2.1; +http://www.google.com/bot.html)")
            .is_none());
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert_eq!(SignatureStore::from_bytes(b"").unwrap_err(), StoreError::Empty);
        assert_eq!(
            SignatureStore::from_bytes(b"  \n\n").unwrap_err(),
            StoreError::Empty
        );
    }

    #[test]
    fn test_garbage_input_is_rejected() {
        let err = SignatureStore::from_bytes(b"<html>Not Found</html>").unwrap_err();
        assert!(matches!(err, StoreError::Syntax(_)));
    }

    #[test]
    fn test_missing_section_is_rejected() {
        let err = SignatureStore::from_text("[robots]\n[os]\n").unwrap_err();
        assert!(matches!(err, StoreError::MissingSection(_)));
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let text = SAMPLE.replace(
            "[browser_os]\n",
            "[browser_os]\nx[] = \"1\"\n6[] = \"not-a-number\"\n",
        );
        let store = SignatureStore::from_text(&text).unwrap();
        assert_eq!(store.linked_os(6), None);
    }

    #[test]
    fn test_first_match_wins() {
        let store = SignatureStore::builder()
            .browser_signature("Safari", 1)
            .browser_signature("Safari/([0-9.]+)", 2)
            .build();
        let found = store.match_browser("Safari/536.26").unwrap();
        assert_eq!(found.profile_id, 1);
        assert_eq!(found.version, None);
    }

    #[test]
    fn test_disjoint_signatures_are_order_independent() {
        let browsers = [("/firefox\\/([0-9.]+)/si", 1), ("/opera\\/([0-9.]+)/si", 2)];
        let systems = [("/windows nt 6.1/si", 10), ("/linux/si", 20)];
        let build = |reversed: bool| {
            let mut builder = SignatureStore::builder();
            let mut browsers = browsers.to_vec();
            let mut systems = systems.to_vec();
            if reversed {
                browsers.reverse();
                systems.reverse();
            }
            for (pattern, id) in browsers {
                builder = builder.browser_signature(pattern, id);
            }
            for (pattern, id) in systems {
                builder = builder.os_signature(pattern, id);
            }
            builder.build()
        };
        let forward = build(false);
        let backward = build(true);

        for candidate in [
            "Mozilla/5.0 (Windows NT 6.1; rv:21.0) Gecko/20100101 Firefox/21.0",
            "Opera/9.80 (X11; Linux x86_64) Presto/2.12.388 Version/12.15",
            "curl/7.29.0",
        ] {
            assert_eq!(
                forward.match_browser(candidate),
                backward.match_browser(candidate)
            );
            assert_eq!(forward.match_os(candidate), backward.match_os(candidate));
        }
        assert_eq!(
            forward
                .match_browser("Opera/9.80 (X11; Linux x86_64)")
                .map(|found| (found.profile_id, found.version)),
            Some((2, Some("9.80")))
        );
        assert_eq!(forward.match_os("Opera/9.80 (X11; Linux x86_64)"), Some(20));
    }

    #[test]
    fn test_invalid_pattern_is_skipped_not_fatal() {
        let store = SignatureStore::builder()
            .os_signature("/Windows(?=NT)/", 1)
            .os_signature("/Windows/", 2)
            .build();
        assert_eq!(store.match_os("WindowsNT"), Some(2));
    }

    #[test]
    fn test_first_match_swallows_matcher_errors() {
        struct Broken;
        impl Matcher for Broken {
            fn try_match<'t>(
                &self,
                _candidate: &'t str,
            ) -> Result<Option<PatternMatch<'t>>, PatternError> {
                Err(PatternError::Compile("broken".to_string()))
            }
        }
        struct Always;
        impl Matcher for Always {
            fn try_match<'t>(
                &self,
                _candidate: &'t str,
            ) -> Result<Option<PatternMatch<'t>>, PatternError> {
                Ok(Some(PatternMatch { version: None }))
            }
        }

        let broken = Broken;
        let always = Always;
        let signatures: Vec<(&dyn Matcher, ProfileId)> = vec![(&broken, 1), (&always, 2)];
        let (id, _) = first_match(signatures, "anything").unwrap();
        assert_eq!(id, 2);
    }

    #[test]
    fn test_duplicate_robot_keeps_first() {
        let store = SignatureStore::builder()
            .robot(Robot {
                user_agent: "bot".to_string(),
                family: Some("First".to_string()),
                ..Default::default()
            })
            .robot(Robot {
                user_agent: "bot".to_string(),
                family: Some("Second".to_string()),
                ..Default::default()
            })
            .build();
        assert_eq!(store.robot("bot").unwrap().family.as_deref(), Some("First"));
    }
}
