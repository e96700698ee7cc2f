//! Combined results artifact of one crawl run

use crate::evidence::Persistable;
use crate::record::{format_timestamp, EntityRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Every successfully persisted entity of a run
#[derive(Debug, Serialize)]
pub struct CombinedResults<'a> {
    pub total_companies: usize,
    pub search_terms_used: &'a [String],
    pub extraction_date: String,
    pub config_hash: &'a str,
    pub companies: &'a [EntityRecord],
}

impl<'a> CombinedResults<'a> {
    pub fn new(
        companies: &'a [EntityRecord],
        search_terms_used: &'a [String],
        config_hash: &'a str,
        extracted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            total_companies: companies.len(),
            search_terms_used,
            extraction_date: format_timestamp(&extracted_at),
            config_hash,
            companies,
        }
    }
}

impl Persistable for CombinedResults<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Attribute, ExtractedFields};
    use chrono::TimeZone;

    #[test]
    fn test_combined_shape() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        let record = EntityRecord::try_new(
            ExtractedFields::from_pairs([
                (Attribute::BusinessId, "123"),
                (Attribute::BusinessName, "Acme LLC"),
            ]),
            "AA",
            at,
        )
        .unwrap();
        let companies = vec![record];
        let terms = vec!["AA".to_string(), "ZZZ".to_string()];

        let combined = CombinedResults::new(&companies, &terms, "abc123", at);
        let json = serde_json::to_value(&combined).unwrap();

        assert_eq!(json["total_companies"], 1);
        assert_eq!(json["search_terms_used"], serde_json::json!(["AA", "ZZZ"]));
        assert_eq!(json["extraction_date"], "2024-03-05T14:30:00Z");
        assert_eq!(json["config_hash"], "abc123");
        assert_eq!(json["companies"][0]["business_name"], "Acme LLC");
    }
}
