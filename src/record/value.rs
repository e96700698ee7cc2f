//! Attribute values
//!
//! Values come from page text (always UTF-8) or from raw markup bytes, which
//! a portal may serve in a legacy encoding. Bytes that are not UTF-8 are kept
//! as they are and refuse to serialize, because the output format is UTF-8.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Timestamp(DateTime<Utc>),
    Raw(Vec<u8>),
}

impl FieldValue {
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    /// Trims text and keeps it as `Text`
    pub fn text(value: &str) -> Self {
        Self::Text(value.trim().to_string())
    }

    /// Decodes markup bytes, keeping undecodable input as `Raw`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let trimmed = trim_ascii(bytes);
        match std::str::from_utf8(trimmed) {
            Ok(text) => Self::Text(text.trim().to_string()),
            Err(_) => Self::Raw(trimmed.to_vec()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Timestamp(_) => false,
            Self::Raw(bytes) => trim_ascii(bytes).is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::empty()
    }
}

/// Lossy rendering used in logs and data previews
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Timestamp(at) => f.write_str(&format_timestamp(at)),
            Self::Raw(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Timestamp(at) => serializer.serialize_str(&format_timestamp(at)),
            Self::Raw(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => serializer.serialize_str(text),
                Err(e) => Err(S::Error::custom(format!(
                    "{} bytes of non-UTF-8 text cannot be represented ({})",
                    bytes.len(),
                    e
                ))),
            },
        }
    }
}

/// ISO-8601 with second precision and a `Z` offset
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `serialize_with` adapter for [`format_timestamp`]
pub fn serialize_timestamp<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(at))
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}
