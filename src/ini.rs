//! Section-oriented flat-file reading and writing.
//!
//! Both cache files use the same text layout:
//!
//! ```text
//! ; Version: 20130529-01
//! [browser_reg]
//! 1[] = "/safari\/([0-9.]+)/si"
//! 1[] = "5"
//! [main]
//! localversion = "20130529-01"
//! ```
//!
//! `key[] = value` appends to the key's list, `key = value` replaces it.
//! Section and key order is preserved because signature lists are
//! first-match-wins.

use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

use crate::error_handling::IniError;
use crate::utils::compile_regex_unsafe;

/// Ordered `key -> values` mapping of one section.
pub type IniSection = IndexMap<String, Vec<String>>;

static VERSION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(r"(?i)^[;#]\s*version:\s*(\S+)", "VERSION_HEADER"));

/// A parsed section file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    version: Option<String>,
    sections: IndexMap<String, IniSection>,
}

impl IniDocument {
    /// Parses section-file text.
    ///
    /// Returns an error for lines that are neither comments, section headers
    /// nor `key = value` entries, and for entries before the first section.
    pub fn parse(text: &str) -> Result<Self, IniError> {
        let mut doc = IniDocument::default();
        let mut current: Option<String> = None;

        for (idx, raw) in text.trim_start_matches('\u{feff}').lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with(';') || line.starts_with('#') {
                if doc.version.is_none() {
                    if let Some(caps) = VERSION_HEADER.captures(line) {
                        doc.version = Some(caps[1].to_string());
                    }
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let name = rest
                    .strip_suffix(']')
                    .ok_or_else(|| syntax(line_no, "unterminated section header"))?
                    .trim();
                if name.is_empty() {
                    return Err(syntax(line_no, "empty section name"));
                }
                doc.sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| syntax(line_no, "expected `key = value`"))?;
            let section_name = current
                .as_ref()
                .ok_or_else(|| syntax(line_no, "entry outside of a section"))?;
            let key = key.trim();
            let value = unquote(value.trim()).map_err(|msg| syntax(line_no, msg))?;

            let section = doc.sections.entry(section_name.clone()).or_default();
            match key.strip_suffix("[]") {
                Some(list_key) => {
                    let list_key = list_key.trim();
                    if list_key.is_empty() {
                        return Err(syntax(line_no, "empty key"));
                    }
                    section.entry(list_key.to_string()).or_default().push(value);
                }
                None => {
                    if key.is_empty() {
                        return Err(syntax(line_no, "empty key"));
                    }
                    section.insert(key.to_string(), vec![value]);
                }
            }
        }

        Ok(doc)
    }

    /// Version from a `; Version: ...` header comment, if present.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Looks up a section by name.
    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.get(name)
    }

    /// First value of `key` in `section`.
    pub fn value(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?
            .get(key)?
            .first()
            .map(String::as_str)
    }
}

fn syntax(line: usize, message: &str) -> IniError {
    IniError {
        line,
        message: message.to_string(),
    }
}

fn unquote(value: &str) -> Result<String, &'static str> {
    if let Some(rest) = value.strip_prefix('"') {
        if let Some(inner) = rest.strip_suffix('"') {
            return Ok(inner.to_string());
        }
        // A closing quote followed by a trailing comment
        return rest
            .match_indices('"')
            .map(|(end, _)| end)
            .find(|&end| rest[end + 1..].trim_start().starts_with(';'))
            .map(|end| rest[..end].to_string())
            .ok_or("unterminated quoted value");
    }
    // Unquoted values may carry a trailing comment
    let value = value.split(';').next().unwrap_or(value);
    Ok(value.trim().to_string())
}

/// Builds section-file text.
#[derive(Debug, Default)]
pub struct IniWriter {
    out: String,
}

impl IniWriter {
    /// Starts an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `; comment` line.
    pub fn comment(&mut self, text: &str) -> &mut Self {
        self.out.push_str("; ");
        self.out.push_str(text);
        self.out.push('\n');
        self
    }

    /// Appends a `[section]` header.
    pub fn section(&mut self, name: &str) -> &mut Self {
        self.out.push('[');
        self.out.push_str(name);
        self.out.push_str("]\n");
        self
    }

    /// Appends a quoted `key = "value"` entry. Double quotes inside the value are dropped.
    pub fn entry(&mut self, key: &str, value: &str) -> &mut Self {
        self.out.push_str(key);
        self.out.push_str(" = \"");
        self.out.extend(value.chars().filter(|c| *c != '"'));
        self.out.push_str("\"\n");
        self
    }

    /// Returns the rendered text.
    pub fn finish(&mut self) -> String {
        std::mem::take(&mut self.out)
    }
}
