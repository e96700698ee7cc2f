//! Record module
//!
//! This module holds the structured outputs of a crawl:
//! - `FieldValue`: one attribute value, text or raw markup bytes
//! - `EntityRecord` / `ErrorRecord`: success and error-shaped records
//! - `RecordValidator`: usability decision, provenance, serialization guard

mod entity;
mod validator;
mod value;

pub use entity::{EntityRecord, ErrorRecord, RecordStatus, ValidatedRecord};
pub use validator::RecordValidator;
pub use value::{format_timestamp, serialize_timestamp, FieldValue};
