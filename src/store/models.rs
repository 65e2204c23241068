//! Typed records of the signature database.
//!
//! Every descriptive field is optional: empty strings in the source become
//! `None` at load time so the classifier never has to tell "empty" from
//! "missing".

use crate::store::pattern::Pattern;

/// Identifier of a browser profile, browser type or OS profile.
pub type ProfileId = u32;

/// A crawler identified by its exact user agent string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Robot {
    /// Exact user agent string the robot sends
    pub user_agent: String,
    /// Family name (e.g. "Googlebot")
    pub family: Option<String>,
    /// Display name (e.g. "Googlebot/2.1")
    pub name: Option<String>,
    /// Information page
    pub url: Option<String>,
    /// Operator
    pub company: Option<String>,
    /// Operator homepage
    pub company_url: Option<String>,
    /// Icon file name
    pub icon: Option<String>,
    /// OS the robot is known to run on
    pub os_id: Option<ProfileId>,
    /// Path appended to the info base URL
    pub info_suffix: Option<String>,
}

/// Descriptive record attached to a browser signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserProfile {
    /// Category in the browser type table
    pub type_id: Option<ProfileId>,
    /// Family name (e.g. "Safari")
    pub family: Option<String>,
    /// Information page
    pub url: Option<String>,
    /// Vendor
    pub company: Option<String>,
    /// Vendor homepage
    pub company_url: Option<String>,
    /// Icon file name
    pub icon: Option<String>,
    /// Path appended to the info base URL
    pub info_suffix: Option<String>,
}

/// Human-readable browser category ("Browser", "Robot", "Library", ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserType {
    /// Category label
    pub label: Option<String>,
}

/// Descriptive record of an operating system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsProfile {
    /// Family name (e.g. "OS X")
    pub family: Option<String>,
    /// Display name (e.g. "OS X 10.8 Mountain Lion")
    pub name: Option<String>,
    /// Information page
    pub url: Option<String>,
    /// Vendor
    pub company: Option<String>,
    /// Vendor homepage
    pub company_url: Option<String>,
    /// Icon file name
    pub icon: Option<String>,
}

/// A compiled pattern and the profile it resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    /// Pattern tested against the candidate
    pub pattern: Pattern,
    /// Profile selected when the pattern matches
    pub profile_id: ProfileId,
}

impl Signature {
    /// Compiles `pattern` for `profile_id`.
    pub fn new(pattern: &str, profile_id: ProfileId) -> Self {
        Self {
            pattern: Pattern::new(pattern),
            profile_id,
        }
    }
}

/// Non-empty positional field.
fn text(row: &[String], idx: usize) -> Option<String> {
    row.get(idx)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Non-empty positional field parsed as an id.
pub(crate) fn id(row: &[String], idx: usize) -> Option<ProfileId> {
    row.get(idx).and_then(|v| v.trim().parse().ok())
}

impl Robot {
    /// Builds a robot from `[ua, family, name, url, company, company_url, icon, os_id, info]`.
    ///
    /// Rows without a user agent are rejected.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let user_agent = row.first().filter(|ua| !ua.is_empty())?.clone();
        Some(Self {
            user_agent,
            family: text(row, 1),
            name: text(row, 2),
            url: text(row, 3),
            company: text(row, 4),
            company_url: text(row, 5),
            icon: text(row, 6),
            os_id: id(row, 7),
            info_suffix: text(row, 8),
        })
    }
}

impl BrowserProfile {
    /// Builds a profile from `[type_id, family, url, company, company_url, icon, info]`.
    pub fn from_row(row: &[String]) -> Self {
        Self {
            type_id: id(row, 0),
            family: text(row, 1),
            url: text(row, 2),
            company: text(row, 3),
            company_url: text(row, 4),
            icon: text(row, 5),
            info_suffix: text(row, 6),
        }
    }
}

impl BrowserType {
    /// Builds a type from `[label]`.
    pub fn from_row(row: &[String]) -> Self {
        Self {
            label: text(row, 0),
        }
    }
}

impl OsProfile {
    /// Builds a profile from `[family, name, url, company, company_url, icon]`.
    pub fn from_row(row: &[String]) -> Self {
        Self {
            family: text(row, 0),
            name: text(row, 1),
            url: text(row, 2),
            company: text(row, 3),
            company_url: text(row, 4),
            icon: text(row, 5),
        }
    }
}
