//! Tiered field extraction
//!
//! Tiers run in priority order and stop as soon as one yields a business
//! name. Lookups report "missing" as an empty value; nothing here fails.

use crate::driver::{ElementHandle, PageDriver};
use crate::extract::attributes::{
    ADDRESS_LOCATORS, ADDRESS_SEPARATOR, DIRECT_LOCATORS, TABLE_KEYWORDS, TEXT_PATTERNS,
};
use crate::extract::{Attribute, ExtractedFields, ExtractionTier};
use crate::record::FieldValue;
use regex::bytes::{Regex, RegexBuilder};

/// Turns the current detail page into a best-effort attribute mapping
pub struct FieldExtractor {
    patterns: Vec<(Attribute, Vec<Regex>)>,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor {
    /// Compiles the text-pattern table
    pub fn new() -> Self {
        let patterns = TEXT_PATTERNS
            .iter()
            .map(|(attribute, sources)| {
                let compiled = sources
                    .iter()
                    .filter_map(|source| {
                        RegexBuilder::new(source)
                            .case_insensitive(true)
                            .unicode(false)
                            .build()
                            .map_err(|e| {
                                tracing::error!(pattern = source, error = %e, "Skipping invalid text pattern")
                            })
                            .ok()
                    })
                    .collect();
                (*attribute, compiled)
            })
            .collect();

        Self { patterns }
    }

    /// Runs the tiers against the driver's current page
    pub async fn extract<D: PageDriver + ?Sized>(&self, driver: &D) -> ExtractedFields {
        let mut history = Vec::new();

        let mut fields = direct_locators(driver).await;
        history.push(ExtractionTier::DirectLocator);

        if !fields.has_name() {
            tracing::debug!(url = %driver.current_url(), "Direct locators found no name; scanning tables");
            fields = table_scan(driver).await;
            history.push(ExtractionTier::TableScan);
        }

        if !fields.has_name() {
            tracing::debug!(url = %driver.current_url(), "Table scan found no name; matching text patterns");
            fields = self.text_patterns(driver).await;
            history.push(ExtractionTier::TextPattern);
        }

        let fields = fields.with_history(&history);
        tracing::debug!(
            url = %driver.current_url(),
            tier = ?fields.tier(),
            identity = fields.has_identity(),
            "Extraction finished"
        );
        fields
    }

    /// Tier 3: regular expressions over the raw markup bytes
    async fn text_patterns<D: PageDriver + ?Sized>(&self, driver: &D) -> ExtractedFields {
        let mut fields = ExtractedFields::new();
        let markup = match driver.content().await {
            Ok(markup) => markup,
            Err(e) => {
                tracing::debug!(error = %e, "Page markup unavailable for text patterns");
                return fields;
            }
        };

        for (attribute, patterns) in &self.patterns {
            let found = patterns
                .iter()
                .find_map(|re| re.captures(&markup).and_then(|c| c.get(1)));
            if let Some(m) = found {
                fields.set(*attribute, FieldValue::from_bytes(m.as_bytes()));
            }
        }
        fields
    }
}

/// Tier 1: fixed element locators per attribute
async fn direct_locators<D: PageDriver + ?Sized>(driver: &D) -> ExtractedFields {
    let mut fields = ExtractedFields::new();

    for (attribute, selector) in DIRECT_LOCATORS {
        fields.set(*attribute, FieldValue::text(&text_of(driver, selector).await));
    }

    for (attribute, locators) in ADDRESS_LOCATORS {
        let line = text_of(driver, locators.line).await;
        let city = text_of(driver, locators.city).await;
        let state = text_of(driver, locators.state).await;
        let zip = text_of(driver, locators.zip).await;
        let address = compose_address(&line, &city, &state, &zip);
        fields.set(*attribute, FieldValue::text(&address));
    }

    fields
}

/// Tier 2: label/value rows of any table on the page
async fn table_scan<D: PageDriver + ?Sized>(driver: &D) -> ExtractedFields {
    let mut fields = ExtractedFields::new();

    let rows = match driver.query_all("tr").await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::debug!(error = %e, "Table rows unavailable");
            return fields;
        }
    };

    for row in rows {
        let cells = match driver.query_within(row, "td, th").await {
            Ok(cells) if cells.len() >= 2 => cells,
            _ => continue,
        };
        let label = handle_text(driver, cells[0]).await.to_lowercase();
        let value = handle_text(driver, cells[1]).await;
        if label.is_empty() || value.is_empty() {
            continue;
        }

        if let Some(attribute) = classify_label(&label) {
            if !fields.is_set(attribute) {
                fields.set(attribute, FieldValue::text(&value));
            }
        }
    }

    fields
}

/// Attribute named by a lower-cased row label; first keyword group wins
pub fn classify_label(label: &str) -> Option<Attribute> {
    TABLE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| label.contains(k)))
        .map(|(attribute, _)| *attribute)
}

/// Joins an address line with its "city, state zip" line, omitting empty parts
pub fn compose_address(line: &str, city: &str, state: &str, zip: &str) -> String {
    let locality = format!("{}, {} {}", city.trim(), state.trim(), zip.trim());
    let locality = locality.trim_matches(|c| c == ' ' || c == ',');

    [line.trim(), locality]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(ADDRESS_SEPARATOR)
}

async fn text_of<D: PageDriver + ?Sized>(driver: &D, selector: &str) -> String {
    match driver.query_one(selector).await {
        Ok(Some(element)) => handle_text(driver, element).await,
        Ok(None) => String::new(),
        Err(e) => {
            tracing::debug!(selector, error = %e, "Locator lookup failed");
            String::new()
        }
    }
}

async fn handle_text<D: PageDriver + ?Sized>(driver: &D, element: ElementHandle) -> String {
    driver
        .text_content(element)
        .await
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::scripted::ScriptedDriver;

    const URL: &str = "https://registry.example/detail";

    async fn driver_on(html: &[u8]) -> ScriptedDriver {
        let mut driver = ScriptedDriver::new().page(URL, html.to_vec());
        driver.navigate(URL).await.unwrap();
        driver
    }

    #[test]
    fn test_compose_address() {
        assert_eq!(
            compose_address("100 Main St", "Topeka", "KS", "66603"),
            "100 Main St | Topeka, KS 66603"
        );
        assert_eq!(compose_address("", "Topeka", "KS", "66603"), "Topeka, KS 66603");
        assert_eq!(compose_address("PO Box 1", "", "", ""), "PO Box 1");
        assert_eq!(compose_address("", "", "", ""), "");
    }

    #[test]
    fn test_classify_label_first_group_wins() {
        assert_eq!(classify_label("entity id"), Some(Attribute::BusinessId));
        assert_eq!(classify_label("entity name:"), Some(Attribute::BusinessName));
        assert_eq!(classify_label("entity type"), Some(Attribute::Type));
        assert_eq!(classify_label("current status"), Some(Attribute::Status));
        assert_eq!(classify_label("phone"), None);
    }

    #[tokio::test]
    async fn test_direct_locator_name_short_circuits() {
        let html = br#"<html><body>
            <span id="MainContent_lblEntityID">4521</span>
            <span id="MainContent_lblEntityName"> Acme LLC </span>
            <span id="MainContent_lblEntityStatus">Active</span>
            <span id="MainContent_lblPOAddress">100 Main St</span>
            <span id="MainContent_lblPOAddressCity">Topeka</span>
            <span id="MainContent_lblPOAddressState">KS</span>
            <span id="MainContent_lblPOAddressZip">66603</span>
            <table><tr><td>Entity Name</td><td>Other Name</td></tr></table>
        </body></html>"#;
        let driver = driver_on(html).await;

        let fields = FieldExtractor::new().extract(&driver).await;
        assert_eq!(fields.tiers_run(), &[ExtractionTier::DirectLocator]);
        assert_eq!(fields.get(Attribute::BusinessName).as_text(), Some("Acme LLC"));
        assert_eq!(fields.get(Attribute::BusinessId).as_text(), Some("4521"));
        assert_eq!(fields.get(Attribute::Status).as_text(), Some("Active"));
        assert_eq!(
            fields.get(Attribute::PrincipalOfficeAddress).as_text(),
            Some("100 Main St | Topeka, KS 66603")
        );
        assert!(fields.get(Attribute::RegisteredOfficeAddress).is_empty());
    }

    #[tokio::test]
    async fn test_table_scan_when_locators_missing() {
        let html = br#"<html><body><table>
            <tr><th>Field</th></tr>
            <tr><td>Entity Name</td><td>Acme LLC</td></tr>
            <tr><td>Entity ID</td><td>123</td></tr>
            <tr><td>Business Name</td><td>Later Row</td></tr>
            <tr><td>Status</td><td></td></tr>
        </table></body></html>"#;
        let driver = driver_on(html).await;

        let fields = FieldExtractor::new().extract(&driver).await;
        assert_eq!(fields.tier(), Some(ExtractionTier::TableScan));
        assert_eq!(fields.get(Attribute::BusinessName).as_text(), Some("Acme LLC"));
        assert_eq!(fields.get(Attribute::BusinessId).as_text(), Some("123"));
        assert!(fields.get(Attribute::Status).is_empty());
        assert!(fields.has_identity());
    }

    #[tokio::test]
    async fn test_text_patterns_as_last_resort() {
        let html = b"<html><body><div><b>Business Name:</b> Acme Holdings\n</div>\
            <div><b>Business ID:</b> 998877</div></body></html>";
        let driver = driver_on(html).await;

        let fields = FieldExtractor::new().extract(&driver).await;
        assert_eq!(
            fields.tiers_run(),
            &[
                ExtractionTier::DirectLocator,
                ExtractionTier::TableScan,
                ExtractionTier::TextPattern
            ]
        );
        assert_eq!(fields.get(Attribute::BusinessName).as_text(), Some("Acme Holdings"));
        assert_eq!(fields.get(Attribute::BusinessId).as_text(), Some("998877"));
    }

    #[tokio::test]
    async fn test_text_patterns_keep_undecodable_bytes() {
        let html = b"<html><body><p><i>Entity Name</i> Caf\xe9 Rouge</p></body></html>";
        let driver = driver_on(html).await;

        let fields = FieldExtractor::new().extract(&driver).await;
        assert_eq!(
            fields.get(Attribute::BusinessName),
            &FieldValue::Raw(b"Caf\xe9 Rouge".to_vec())
        );
    }

    #[tokio::test]
    async fn test_empty_page_yields_empty_mapping() {
        let driver = driver_on(b"<html><body></body></html>").await;

        let fields = FieldExtractor::new().extract(&driver).await;
        assert!(!fields.has_name());
        assert_eq!(fields.tier(), Some(ExtractionTier::TextPattern));
    }
}
