//! Classification Engine.
//!
//! Resolves a user agent string against a [`SignatureStore`] in a fixed order:
//!
//! 1. Exact robot match (short-circuits everything else)
//! 2. First matching browser signature
//! 3. The browser's linked OS, if it has one (skips the OS scan)
//! 4. First matching OS signature
//!
//! The engine does no I/O and never mutates the store.

mod result;

use strum_macros::{Display, EnumIter};

use crate::store::{OsProfile, SignatureStore};

pub use result::{ClassificationResult, UNKNOWN, UNKNOWN_ICON};

/// Kind reported for robots.
pub const ROBOT_KIND: &str = "Robot";

/// Which resolution branch produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Resolution {
    /// Exact robot match
    Robot,
    /// Browser signature whose profile is linked to an OS
    LinkedOs,
    /// Browser and/or OS identified by signature scans
    OsScan,
    /// Nothing matched
    Default,
}

/// Classifies `candidate`. See [`classify_traced`].
pub fn classify(store: &SignatureStore, candidate: &str, info_url: &str) -> ClassificationResult {
    classify_traced(store, candidate, info_url).0
}

/// Classifies `candidate` and reports which branch resolved it.
///
/// `info_url` is the base that profile info suffixes are appended to. An empty
/// candidate yields the default result.
pub fn classify_traced(
    store: &SignatureStore,
    candidate: &str,
    info_url: &str,
) -> (ClassificationResult, Resolution) {
    let mut result = ClassificationResult::default();
    if candidate.is_empty() {
        return (result, Resolution::Default);
    }

    if let Some(robot) = store.robot(candidate) {
        log::trace!("Robot match for {:?}", candidate);
        result.kind = ROBOT_KIND.to_string();
        set(&mut result.ua_family, &robot.family);
        set(&mut result.ua_name, &robot.name);
        set(&mut result.ua_url, &robot.url);
        set(&mut result.ua_company, &robot.company);
        set(&mut result.ua_company_url, &robot.company_url);
        set(&mut result.ua_icon, &robot.icon);
        if let Some(os) = robot.os_id.and_then(|id| store.os(id)) {
            apply_os(&mut result, os);
        }
        if let Some(suffix) = &robot.info_suffix {
            result.ua_info_url = join_info_url(info_url, suffix);
        }
        return (result, Resolution::Robot);
    }

    let browser = store.match_browser(candidate);
    if let Some(found) = &browser {
        log::trace!(
            "Browser signature matched profile {} for {:?}",
            found.profile_id,
            candidate
        );
        if let Some(version) = found.version {
            result.ua_version = version.to_string();
        }
        if let Some(profile) = store.browser(found.profile_id) {
            if let Some(label) = profile
                .type_id
                .and_then(|id| store.browser_type(id))
                .and_then(|t| t.label.as_ref())
            {
                result.kind = label.clone();
            }
            if let Some(family) = &profile.family {
                result.ua_family = family.clone();
                result.ua_name = match found.version {
                    Some(version) => format!("{} {}", family, version),
                    None => family.clone(),
                };
            }
            set(&mut result.ua_url, &profile.url);
            set(&mut result.ua_company, &profile.company);
            set(&mut result.ua_company_url, &profile.company_url);
            set(&mut result.ua_icon, &profile.icon);
            if let Some(suffix) = &profile.info_suffix {
                result.ua_info_url = join_info_url(info_url, suffix);
            }
        }

        if let Some(os_id) = store.linked_os(found.profile_id) {
            if let Some(os) = store.os(os_id) {
                apply_os(&mut result, os);
            }
            return (result, Resolution::LinkedOs);
        }
    }

    match store.match_os(candidate) {
        Some(os_id) => {
            log::trace!("OS signature matched profile {} for {:?}", os_id, candidate);
            if let Some(os) = store.os(os_id) {
                apply_os(&mut result, os);
            }
            (result, Resolution::OsScan)
        }
        None if browser.is_some() => (result, Resolution::OsScan),
        None => (result, Resolution::Default),
    }
}

fn apply_os(result: &mut ClassificationResult, os: &OsProfile) {
    set(&mut result.os_family, &os.family);
    set(&mut result.os_name, &os.name);
    set(&mut result.os_url, &os.url);
    set(&mut result.os_company, &os.company);
    set(&mut result.os_company_url, &os.company_url);
    set(&mut result.os_icon, &os.icon);
}

/// Overwrites `field` only with a present value.
fn set(field: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        field.clone_from(value);
    }
}

/// Appends `suffix` to `base` without doubling the separating slash.
fn join_info_url(base: &str, suffix: &str) -> String {
    if suffix.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), suffix)
    } else {
        format!("{}{}", base, suffix)
    }
}
