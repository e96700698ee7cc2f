//! Evidence module
//!
//! This module owns everything written to the output directory:
//! - `EvidenceStore`: tiered persistence that always yields an artifact
//! - `PageSnapshot`: the page markup a record was produced from
//! - `OutputLayout`: `json/`, `html_fallback/`, `errors/`, and the session log
//! - Artifact naming and identifier sanitization

mod layout;
mod naming;
mod snapshot;
mod store;

pub use layout::{OutputLayout, SESSION_LOG};
pub use naming::{
    combined_destination, entity_destination, error_record_destination, sanitize, timestamp,
    FILLER,
};
pub use snapshot::PageSnapshot;
pub use store::{ArtifactLocation, EvidenceStore, Persistable, RawMarkup};
