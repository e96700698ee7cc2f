//! Field extraction module
//!
//! This module turns a rendered detail page into an attribute mapping using
//! three strategies in strict priority order:
//! - Direct locators: one known element per attribute
//! - Table scan: label/value rows matched against keyword groups
//! - Text patterns: regular expressions over the raw markup

mod attributes;
mod extractor;
mod fields;

pub use attributes::{
    AddressLocators, Attribute, ADDRESS_LOCATORS, ADDRESS_SEPARATOR, DIRECT_LOCATORS,
    TABLE_KEYWORDS, TEXT_PATTERNS,
};
pub use extractor::{classify_label, compose_address, FieldExtractor};
pub use fields::{ExtractedFields, ExtractionTier};
