//! Validated record shapes

use crate::evidence::Persistable;
use crate::extract::{Attribute, ExtractedFields};
use crate::record::value::{format_timestamp, serialize_timestamp};
use crate::record::FieldValue;
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Provenance status attached by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Success,
    /// No tier produced both a name and an identifier
    DataExtractionFailed,
    /// The detail page could not be read at all
    ExtractionError,
    /// The candidate record could not be serialized
    Error,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::DataExtractionFailed => "data_extraction_failed",
            Self::ExtractionError => "extraction_error",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successfully structured registry entity
///
/// Only constructible from a mapping with a non-empty `business_id` and
/// `business_name`, so every value of this type satisfies the success
/// invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    fields: BTreeMap<Attribute, FieldValue>,
    search_term: String,
    extracted_at: DateTime<Utc>,
}

impl EntityRecord {
    /// Attaches provenance, or hands the mapping back when it lacks identity
    pub fn try_new(
        fields: ExtractedFields,
        search_term: &str,
        extracted_at: DateTime<Utc>,
    ) -> Result<Self, ExtractedFields> {
        if !fields.has_identity() {
            return Err(fields);
        }
        Ok(Self {
            fields: fields.into_values(),
            search_term: search_term.to_string(),
            extracted_at,
        })
    }

    pub fn get(&self, attribute: Attribute) -> &FieldValue {
        &self.fields[&attribute]
    }

    pub fn business_id(&self) -> String {
        self.get(Attribute::BusinessId).to_string()
    }

    pub fn business_name(&self) -> String {
        self.get(Attribute::BusinessName).to_string()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn extracted_at(&self) -> DateTime<Utc> {
        self.extracted_at
    }

    pub fn fields(&self) -> &BTreeMap<Attribute, FieldValue> {
        &self.fields
    }
}

impl Serialize for EntityRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Attribute::ALL.len() + 3))?;
        for attribute in Attribute::ALL {
            map.serialize_entry(attribute.key(), self.get(attribute))?;
        }
        map.serialize_entry("search_term", &self.search_term)?;
        map.serialize_entry("extracted_at", &format_timestamp(&self.extracted_at))?;
        map.serialize_entry("status", &RecordStatus::Success)?;
        map.end()
    }
}

/// Error-shaped record standing in for an entity that could not be structured
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub search_term: String,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    pub error_message: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub html_fallback_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_business_data: Option<String>,
}

/// Validator output: a structured entity or its error-shaped substitute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValidatedRecord {
    Success(EntityRecord),
    Error(ErrorRecord),
}

impl ValidatedRecord {
    pub fn status(&self) -> RecordStatus {
        match self {
            Self::Success(_) => RecordStatus::Success,
            Self::Error(error) => error.status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn search_term(&self) -> &str {
        match self {
            Self::Success(record) => record.search_term(),
            Self::Error(error) => &error.search_term,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityRecord> {
        match self {
            Self::Success(record) => Some(record),
            Self::Error(_) => None,
        }
    }

    /// Lossy one-line rendering, safe for any content
    pub fn preview(&self) -> String {
        match self {
            Self::Success(record) => {
                let parts: Vec<String> = record
                    .fields
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Self::Error(error) => format!("{:?}", error),
        }
    }
}

impl Persistable for ValidatedRecord {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_try_new_requires_identity() {
        let fields = ExtractedFields::from_pairs([(Attribute::BusinessName, "Acme LLC")]);
        let back = EntityRecord::try_new(fields.clone(), "AA", at()).unwrap_err();
        assert_eq!(back, fields);
    }

    #[test]
    fn test_success_serializes_every_key() {
        let fields = ExtractedFields::from_pairs([
            (Attribute::BusinessId, "123"),
            (Attribute::BusinessName, "Acme LLC"),
            (Attribute::Status, "Active and in good standing"),
        ]);
        let record = EntityRecord::try_new(fields, "AA", at()).unwrap();
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();

        for attribute in Attribute::ALL {
            assert!(json.get(attribute.key()).is_some(), "missing {}", attribute);
        }
        assert_eq!(json["status"], "success");
        assert_eq!(json["entity_status"], "Active and in good standing");
        assert_eq!(json["search_term"], "AA");
        assert_eq!(json["extracted_at"], "2024-03-05T14:30:00Z");
        assert_eq!(json["type"], "");
    }

    #[test]
    fn test_error_record_shape() {
        let record = ValidatedRecord::Error(ErrorRecord {
            search_term: "AA".to_string(),
            status: RecordStatus::DataExtractionFailed,
            error_type: None,
            error_message: "Essential data missing".to_string(),
            timestamp: at(),
            url: "https://registry.example/detail".to_string(),
            html_fallback_file: Some(PathBuf::from("out/html_fallback/x.html")),
            partial_business_data: None,
        });
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();

        assert_eq!(json["status"], "data_extraction_failed");
        assert_eq!(json["html_fallback_file"], "out/html_fallback/x.html");
        assert!(json.get("error_type").is_none());
        assert!(!record.is_success());
    }
}
