//! Signature patterns.
//!
//! The database ships PCRE-style patterns with delimiters and trailing
//! modifiers, e.g. `/safari\/([0-9.]+)/si`. They are translated to the
//! `regex` crate's syntax once, at load time. Bare patterns without
//! delimiters (`Safari/([0-9.]+)`) are compiled as-is.
//!
//! A pattern that cannot be translated or compiled is kept in the list, so
//! ordering is preserved, but never matches.

use regex::Regex;
use thiserror::Error;

/// Delimiters recognised around a pattern body.
const DELIMITERS: &[char] = &['/', '#', '~', '!', '@', '%'];

/// Why a signature pattern is unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// A trailing modifier has no equivalent.
    #[error("unsupported pattern modifier '{0}'")]
    UnsupportedModifier(char),

    /// The translated pattern failed to compile (e.g. look-around or back-references).
    #[error("pattern does not compile: {0}")]
    Compile(String),
}

/// Outcome of a successful match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch<'t> {
    /// First capture group, when it participated and is non-empty
    pub version: Option<&'t str>,
}

/// Anything a signature list can be scanned with.
///
/// `try_match` may fail; scanners treat failures as "no match" and keep going.
pub trait Matcher {
    /// Tests `candidate`, returning the match details on success.
    fn try_match<'t>(&self, candidate: &'t str) -> Result<Option<PatternMatch<'t>>, PatternError>;

    /// Like `try_match`, with errors collapsed into "no match".
    fn matches<'t>(&self, candidate: &'t str) -> Option<PatternMatch<'t>> {
        match self.try_match(candidate) {
            Ok(found) => found,
            Err(e) => {
                log::trace!("Skipping unusable pattern: {}", e);
                None
            }
        }
    }
}

/// A signature pattern compiled from its database source text.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    compiled: Result<Regex, PatternError>,
}

impl Pattern {
    /// Compiles `source`. Never fails; unusable patterns are recorded as such.
    pub fn new(source: &str) -> Self {
        let compiled = translate(source).and_then(|translated| {
            Regex::new(&translated).map_err(|e| PatternError::Compile(e.to_string()))
        });
        if let Err(ref e) = compiled {
            log::debug!("Pattern {:?} will never match: {}", source, e);
        }
        Self {
            source: source.to_string(),
            compiled,
        }
    }

    /// Text the pattern was built from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the pattern compiled.
    pub fn is_valid(&self) -> bool {
        self.compiled.is_ok()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Matcher for Pattern {
    fn try_match<'t>(&self, candidate: &'t str) -> Result<Option<PatternMatch<'t>>, PatternError> {
        let regex = self.compiled.as_ref().map_err(Clone::clone)?;
        Ok(regex.captures(candidate).map(|caps| PatternMatch {
            version: caps
                .get(1)
                .map(|m| m.as_str())
                .filter(|v| !v.is_empty()),
        }))
    }
}

/// Rewrites a delimited PCRE pattern into `regex` syntax.
fn translate(source: &str) -> Result<String, PatternError> {
    let Some((delimiter, body, modifiers)) = split_delimited(source) else {
        return Ok(source.to_string());
    };

    let mut flags = String::new();
    let mut anchored = false;
    for modifier in modifiers.chars() {
        match modifier {
            'i' | 's' | 'm' | 'x' | 'U' => {
                if !flags.contains(modifier) {
                    flags.push(modifier);
                }
            }
            'A' => anchored = true,
            // Unicode and dollar-end-only have no effect here
            'u' | 'D' => {}
            other => return Err(PatternError::UnsupportedModifier(other)),
        }
    }

    let body = unescape_delimiter(body, delimiter);
    let mut translated = String::with_capacity(body.len() + 8);
    if !flags.is_empty() {
        translated.push_str("(?");
        translated.push_str(&flags);
        translated.push(')');
    }
    if anchored {
        translated.push_str("^(?:");
        translated.push_str(&body);
        translated.push(')');
    } else {
        translated.push_str(&body);
    }
    Ok(translated)
}

/// Splits `/body/mods` into its parts. `None` for bare patterns.
fn split_delimited(source: &str) -> Option<(char, &str, &str)> {
    let delimiter = source.chars().next().filter(|c| DELIMITERS.contains(c))?;
    let end = source.rfind(delimiter)?;
    if end == 0 {
        return None;
    }
    let modifiers = &source[end + 1..];
    if !modifiers.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((delimiter, &source[1..end], modifiers))
}

/// `\/` only escapes the delimiter in PCRE; the delimiter itself may be a
/// regex metacharacter, so re-escape it for `regex`.
fn unescape_delimiter(body: &str, delimiter: char) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next) if next == delimiter => out.push_str(&regex::escape(&next.to_string())),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}
