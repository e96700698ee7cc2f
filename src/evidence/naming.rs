//! Artifact naming
//!
//! Names combine a sanitized identifier with a second-resolution timestamp;
//! collisions within the same second are resolved by the store.

use chrono::Utc;

/// Filler that replaces each run of non-word characters
pub const FILLER: char = '_';

/// Collapses every run of non-word characters to one filler and bounds the length
///
/// # Arguments
///
/// * `name` - Free text, usually a business name or search term
/// * `limit` - Maximum number of characters kept
///
/// # Example
///
/// ```
/// use registry_harvest::evidence::sanitize;
///
/// assert_eq!(sanitize("Acme, LLC & Co.", 30), "Acme_LLC_Co_");
/// ```
pub fn sanitize(name: &str, limit: usize) -> String {
    let mut clean = String::with_capacity(name.len());
    let mut in_run = false;

    for c in name.chars() {
        if c.is_alphanumeric() || c == '_' {
            clean.push(c);
            in_run = false;
        } else if !in_run {
            clean.push(FILLER);
            in_run = true;
        }
    }

    clean.chars().take(limit).collect()
}

/// Timestamp used in artifact names
pub fn timestamp() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Relative destination of a structured entity record
pub fn entity_destination(business_name: &str, limit: usize) -> String {
    format!("json/business_{}_{}.json", sanitize(business_name, limit), timestamp())
}

/// Relative destination of an error-shaped record
pub fn error_record_destination(status: &str, search_term: &str, limit: usize) -> String {
    format!("errors/{}_{}_{}.json", status, sanitize(search_term, limit), timestamp())
}

/// Relative destination of the combined artifact of one run
pub fn combined_destination(run_timestamp: &str) -> String {
    format!("all_businesses_{}.json", run_timestamp)
}
