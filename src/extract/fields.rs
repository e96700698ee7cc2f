//! Output of one extraction pass

use crate::extract::Attribute;
use crate::record::FieldValue;
use std::collections::BTreeMap;
use std::fmt;

/// Strategy level that produced a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionTier {
    DirectLocator,
    TableScan,
    TextPattern,
}

impl fmt::Display for ExtractionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectLocator => write!(f, "direct_locator"),
            Self::TableScan => write!(f, "table_scan"),
            Self::TextPattern => write!(f, "text_pattern"),
        }
    }
}

/// Best-effort attribute mapping; every attribute is present, possibly empty
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFields {
    values: BTreeMap<Attribute, FieldValue>,
    tiers_run: Vec<ExtractionTier>,
}

impl Default for ExtractedFields {
    fn default() -> Self {
        Self {
            values: Attribute::ALL
                .iter()
                .map(|a| (*a, FieldValue::empty()))
                .collect(),
            tiers_run: Vec::new(),
        }
    }
}

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapping from text values, leaving the rest empty
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (Attribute, &'a str)>) -> Self {
        let mut fields = Self::new();
        for (attribute, value) in pairs {
            fields.set(attribute, FieldValue::text(value));
        }
        fields
    }

    pub fn get(&self, attribute: Attribute) -> &FieldValue {
        // Every attribute is seeded in `Default`
        &self.values[&attribute]
    }

    pub fn set(&mut self, attribute: Attribute, value: FieldValue) {
        self.values.insert(attribute, value);
    }

    pub fn is_set(&self, attribute: Attribute) -> bool {
        !self.get(attribute).is_empty()
    }

    /// True when the mapping carries a usable entity name
    pub fn has_name(&self) -> bool {
        self.is_set(Attribute::BusinessName)
    }

    /// True when both the name and the registry identifier are present
    pub fn has_identity(&self) -> bool {
        self.has_name() && self.is_set(Attribute::BusinessId)
    }

    /// Tiers attempted, in order; the last one produced this mapping
    pub fn tiers_run(&self) -> &[ExtractionTier] {
        &self.tiers_run
    }

    pub fn tier(&self) -> Option<ExtractionTier> {
        self.tiers_run.last().copied()
    }

    pub(crate) fn record_tier(&mut self, tier: ExtractionTier) {
        self.tiers_run.push(tier);
    }

    pub(crate) fn with_history(mut self, tiers: &[ExtractionTier]) -> Self {
        self.tiers_run = tiers.to_vec();
        self
    }

    pub fn values(&self) -> &BTreeMap<Attribute, FieldValue> {
        &self.values
    }

    pub fn into_values(self) -> BTreeMap<Attribute, FieldValue> {
        self.values
    }

    /// Lossy one-line rendering of the populated attributes
    pub fn preview(&self) -> String {
        let parts: Vec<String> = self
            .values
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }
}
