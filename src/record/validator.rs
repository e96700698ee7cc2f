//! Record validation
//!
//! Decides whether an extracted mapping is a usable entity, attaches
//! provenance, and guarantees the returned record can be serialized.

use crate::evidence::{EvidenceStore, PageSnapshot};
use crate::extract::ExtractedFields;
use crate::record::{EntityRecord, ErrorRecord, RecordStatus, ValidatedRecord};
use chrono::Utc;

/// Error category of markup captured for a mapping without identity
const INSUFFICIENT_KIND: &str = "data_extraction_failed";

/// Error category of markup captured when serialization fails
const SERIALIZATION_KIND: &str = "serialization_error";

pub struct RecordValidator {
    preview_limit: usize,
}

impl RecordValidator {
    /// # Arguments
    ///
    /// * `preview_limit` - Maximum characters of original data kept when a
    ///   record has to be replaced by a serialization error record
    pub fn new(preview_limit: usize) -> Self {
        Self { preview_limit }
    }

    /// Finalizes an extracted mapping for `search_term`
    ///
    /// Never fails: mappings without a name/identifier pair become
    /// `data_extraction_failed` records, and a candidate that cannot be
    /// serialized is replaced by a minimal `error` record that references a
    /// markup capture of `page`.
    pub fn validate(
        &self,
        fields: ExtractedFields,
        search_term: &str,
        page: &PageSnapshot,
        store: &EvidenceStore,
    ) -> ValidatedRecord {
        let candidate = match EntityRecord::try_new(fields, search_term, Utc::now()) {
            Ok(record) => ValidatedRecord::Success(record),
            Err(fields) => self.insufficient(fields, search_term, page, store),
        };
        self.ensure_serializable(candidate, search_term, page, store)
    }

    /// Record for a detail page that could not be read at all
    pub fn extraction_failure(
        &self,
        reason: &str,
        search_term: &str,
        page: &PageSnapshot,
        store: &EvidenceStore,
    ) -> ValidatedRecord {
        let capture = store.capture_markup(page, &format!("extract_error_{}", search_term), "extraction_error");
        ValidatedRecord::Error(ErrorRecord {
            search_term: search_term.to_string(),
            status: RecordStatus::ExtractionError,
            error_type: None,
            error_message: reason.to_string(),
            timestamp: Utc::now(),
            url: page.url().to_string(),
            html_fallback_file: capture,
            partial_business_data: None,
        })
    }

    fn insufficient(
        &self,
        fields: ExtractedFields,
        search_term: &str,
        page: &PageSnapshot,
        store: &EvidenceStore,
    ) -> ValidatedRecord {
        tracing::warn!(
            term = %search_term,
            url = %page.url(),
            name = fields.has_name(),
            "Essential business data missing"
        );
        let capture = store.capture_markup(
            page,
            &format!("extract_fail_{}", search_term),
            INSUFFICIENT_KIND,
        );
        let preview = fields.preview();
        ValidatedRecord::Error(ErrorRecord {
            search_term: search_term.to_string(),
            status: RecordStatus::DataExtractionFailed,
            error_type: None,
            error_message: "Essential data missing".to_string(),
            timestamp: Utc::now(),
            url: page.url().to_string(),
            html_fallback_file: capture,
            partial_business_data: (preview != "{}").then(|| self.truncate(&preview)),
        })
    }

    /// Serialization round-trip guard
    fn ensure_serializable(
        &self,
        candidate: ValidatedRecord,
        search_term: &str,
        page: &PageSnapshot,
        store: &EvidenceStore,
    ) -> ValidatedRecord {
        let error = match serde_json::to_vec(&candidate) {
            Ok(_) => return candidate,
            Err(e) => e,
        };

        tracing::error!(term = %search_term, url = %page.url(), error = %error, "JSON serialization failed");
        let capture = store.capture_markup(
            page,
            &format!("json_fail_{}", search_term),
            SERIALIZATION_KIND,
        );
        ValidatedRecord::Error(ErrorRecord {
            search_term: search_term.to_string(),
            status: RecordStatus::Error,
            error_type: Some("json_serialization_failed".to_string()),
            error_message: error.to_string(),
            timestamp: Utc::now(),
            url: page.url().to_string(),
            html_fallback_file: capture,
            partial_business_data: Some(self.truncate(&candidate.preview())),
        })
    }

    fn truncate(&self, text: &str) -> String {
        text.chars().take(self.preview_limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Attribute;
    use crate::record::FieldValue;
    use tempfile::TempDir;

    fn setup() -> (TempDir, EvidenceStore, PageSnapshot) {
        let dir = TempDir::new().unwrap();
        let store = EvidenceStore::open(dir.path(), 30).unwrap();
        let page = PageSnapshot::new(
            "https://registry.example/detail",
            b"<html><body>detail</body></html>".to_vec(),
        );
        (dir, store, page)
    }

    #[test]
    fn test_identity_pair_succeeds() {
        let (_dir, store, page) = setup();
        let fields = ExtractedFields::from_pairs([
            (Attribute::BusinessName, "Acme LLC"),
            (Attribute::BusinessId, "123"),
        ]);

        let record = RecordValidator::new(500).validate(fields, "AA", &page, &store);
        assert_eq!(record.status(), RecordStatus::Success);
        let entity = record.as_entity().unwrap();
        assert_eq!(entity.business_name(), "Acme LLC");
        assert_eq!(entity.search_term(), "AA");
    }

    #[test]
    fn test_missing_identifier_captures_markup() {
        let (_dir, store, page) = setup();
        let fields = ExtractedFields::from_pairs([(Attribute::BusinessName, "Acme LLC")]);

        let record = RecordValidator::new(500).validate(fields, "AA", &page, &store);
        let ValidatedRecord::Error(error) = record else {
            panic!("expected an error record");
        };
        assert_eq!(error.status, RecordStatus::DataExtractionFailed);
        let capture = error.html_fallback_file.unwrap();
        assert!(capture.starts_with(store.layout().html_fallback()));
        let saved = std::fs::read_to_string(capture).unwrap();
        assert!(saved.contains("<!-- Error Type: data_extraction_failed -->"));
        assert!(saved.ends_with("<html><body>detail</body></html>"));
        assert_eq!(
            error.partial_business_data.as_deref(),
            Some("{business_name=Acme LLC}")
        );
    }

    #[test]
    fn test_unserializable_value_is_replaced() {
        let (_dir, store, page) = setup();
        let mut fields = ExtractedFields::from_pairs([
            (Attribute::BusinessName, "Acme LLC"),
            (Attribute::BusinessId, "123"),
        ]);
        fields.set(Attribute::ResidentAgent, FieldValue::Raw(b"J\xf6rg".to_vec()));

        let record = RecordValidator::new(40).validate(fields, "AA", &page, &store);
        let ValidatedRecord::Error(error) = &record else {
            panic!("expected an error record");
        };
        assert_eq!(error.status, RecordStatus::Error);
        assert_eq!(error.error_type.as_deref(), Some("json_serialization_failed"));
        assert!(error.html_fallback_file.as_ref().unwrap().exists());
        assert_eq!(
            error.partial_business_data.as_ref().unwrap().chars().count(),
            40
        );
        assert!(serde_json::to_vec(&record).is_ok());
    }
}
