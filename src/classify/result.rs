//! The classification result record.

use serde::Serialize;

/// Placeholder for every text field nothing was found for.
pub const UNKNOWN: &str = "unknown";

/// Placeholder for icon fields nothing was found for.
pub const UNKNOWN_ICON: &str = "unknown.png";

/// What a user agent string was identified as.
///
/// Every field is always populated; fields that were not resolved hold
/// [`UNKNOWN`] (or [`UNKNOWN_ICON`] for icons). Serializes with the
/// historical key names, so `kind` is emitted as `typ`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    /// Category: `"Robot"`, the browser type label (e.g. `"Browser"`), or `"unknown"`
    #[serde(rename = "typ")]
    pub kind: String,
    /// Browser or robot family
    pub ua_family: String,
    /// Family and version, e.g. `"Safari 536.26"`
    pub ua_name: String,
    /// Version captured from the user agent
    pub ua_version: String,
    /// Browser or robot homepage
    pub ua_url: String,
    /// Vendor
    pub ua_company: String,
    /// Vendor homepage
    pub ua_company_url: String,
    /// Icon file name
    pub ua_icon: String,
    /// Detail page on the database site
    pub ua_info_url: String,
    /// Operating system family
    pub os_family: String,
    /// Operating system display name
    pub os_name: String,
    /// Operating system homepage
    pub os_url: String,
    /// Operating system vendor
    pub os_company: String,
    /// Operating system vendor homepage
    pub os_company_url: String,
    /// Operating system icon file name
    pub os_icon: String,
}

impl Default for ClassificationResult {
    fn default() -> Self {
        let unknown = || UNKNOWN.to_string();
        Self {
            kind: unknown(),
            ua_family: unknown(),
            ua_name: unknown(),
            ua_version: unknown(),
            ua_url: unknown(),
            ua_company: unknown(),
            ua_company_url: unknown(),
            ua_icon: UNKNOWN_ICON.to_string(),
            ua_info_url: unknown(),
            os_family: unknown(),
            os_name: unknown(),
            os_url: unknown(),
            os_company: unknown(),
            os_company_url: unknown(),
            os_icon: UNKNOWN_ICON.to_string(),
        }
    }
}

impl ClassificationResult {
    /// Whether nothing at all was identified.
    pub fn is_unknown(&self) -> bool {
        *self == Self::default()
    }
}
