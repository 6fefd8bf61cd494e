// src/core/rconfig.rs

//! Parser for the line-oriented `.rconfig` format.
//!
//! A document looks like this:
//!
//! ```text
//! # comment
//! [ip; 127.0.0.1]
//! [port; 25575]
//! [password; password123]
//! ```
//!
//! Parsing is lenient: a line without a `;` separator is skipped rather than
//! failing the document. Only the first two `;`-separated segments of a line
//! are consulted, so a value containing a literal `;` is truncated at it.

use crate::core::RelayError;
use std::collections::HashMap;
use std::collections::hash_map;

/// A flat key/value mapping produced by parsing one `.rconfig` text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    entries: HashMap<String, String>,
}

impl ConfigDocument {
    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all entries in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, String> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ConfigDocument {
    type Item = (&'a String, &'a String);
    type IntoIter = hash_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Why a line was dropped by the lenient parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The line has no `;` separating a key from a value.
    MissingSeparator,
}

/// A non-blank, non-comment line that did not produce an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number within the input.
    pub line_number: usize,
    pub reason: SkipReason,
}

/// Parses `.rconfig` text into a `ConfigDocument`.
///
/// Never fails; unparseable lines are skipped silently. Use
/// [`parse_with_diagnostics`] to find out which lines were dropped.
pub fn parse(text: &str) -> ConfigDocument {
    parse_with_diagnostics(text).0
}

/// Parses raw bytes, failing only if the input is not UTF-8 text.
pub fn parse_bytes(raw: &[u8]) -> Result<ConfigDocument, RelayError> {
    let text = std::str::from_utf8(raw).map_err(|_| RelayError::NonTextualConfig)?;
    Ok(parse(text))
}

/// Parses `.rconfig` text and also reports every skipped line.
pub fn parse_with_diagnostics(text: &str) -> (ConfigDocument, Vec<SkippedLine>) {
    let mut entries = HashMap::new();
    let mut skipped = Vec::new();

    for (index, raw_line) in text.split('\n').enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_entry(line) {
            Some((key, value)) => {
                // Last write wins for duplicate keys.
                entries.insert(key, value);
            }
            None => skipped.push(SkippedLine {
                line_number: index + 1,
                reason: SkipReason::MissingSeparator,
            }),
        }
    }

    (ConfigDocument { entries }, skipped)
}

/// Extracts a key/value pair from a trimmed, non-comment line.
fn parse_entry(line: &str) -> Option<(String, String)> {
    let mut segments = line.split(';');
    let raw_key = segments.next()?;
    // Anything past the second segment is ignored.
    let raw_value = segments.next()?;

    let key = raw_key.replace(['[', ']'], "").trim().to_string();

    let value = raw_value.trim();
    let value = match value.strip_suffix(']') {
        Some(stripped) => stripped.trim(),
        None => value,
    };

    Some((key, value.to_string()))
}
