//! Entity attribute schema and the declarative lookup tables of each tier
//!
//! Every tier iterates these tables generically; adding an attribute or a
//! locator is a table edit, not a new code path.

use serde::Serialize;
use std::fmt;

/// One attribute of the entity schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    BusinessId,
    BusinessName,
    Type,
    FormationDate,
    Jurisdiction,
    /// The registry's standing for the entity (serialized as `entity_status`)
    #[serde(rename = "entity_status")]
    Status,
    ResidentAgent,
    LastReportingYear,
    NextReportDueDate,
    ForfeitureDate,
    PrincipalOfficeAddress,
    RegisteredOfficeAddress,
}

impl Attribute {
    /// Every attribute, in output order
    pub const ALL: [Attribute; 12] = [
        Self::BusinessId,
        Self::BusinessName,
        Self::Type,
        Self::FormationDate,
        Self::Jurisdiction,
        Self::Status,
        Self::ResidentAgent,
        Self::LastReportingYear,
        Self::NextReportDueDate,
        Self::ForfeitureDate,
        Self::PrincipalOfficeAddress,
        Self::RegisteredOfficeAddress,
    ];

    /// Key used in serialized records
    pub fn key(&self) -> &'static str {
        match self {
            Self::BusinessId => "business_id",
            Self::BusinessName => "business_name",
            Self::Type => "type",
            Self::FormationDate => "formation_date",
            Self::Jurisdiction => "jurisdiction",
            Self::Status => "entity_status",
            Self::ResidentAgent => "resident_agent",
            Self::LastReportingYear => "last_reporting_year",
            Self::NextReportDueDate => "next_report_due_date",
            Self::ForfeitureDate => "forfeiture_date",
            Self::PrincipalOfficeAddress => "principal_office_address",
            Self::RegisteredOfficeAddress => "registered_office_address",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Direct-locator tier: one element per attribute
pub const DIRECT_LOCATORS: &[(Attribute, &str)] = &[
    (Attribute::BusinessId, "#MainContent_lblEntityID"),
    (Attribute::BusinessName, "#MainContent_lblEntityName"),
    (Attribute::Type, "#MainContent_lblEntityType"),
    (Attribute::FormationDate, "#MainContent_lblFormationDate"),
    (Attribute::Jurisdiction, "#MainContent_lblStateOfOrganization"),
    (Attribute::Status, "#MainContent_lblEntityStatus"),
    (Attribute::ResidentAgent, "#MainContent_lblResidentAgentName"),
    (Attribute::LastReportingYear, "#MainContent_lblLastIROnFile"),
    (Attribute::NextReportDueDate, "#MainContent_lblNextIRDue"),
    (Attribute::ForfeitureDate, "#MainContent_lblForfeitureDate"),
];

/// Element locators of a composite address
#[derive(Debug, Clone, Copy)]
pub struct AddressLocators {
    pub line: &'static str,
    pub city: &'static str,
    pub state: &'static str,
    pub zip: &'static str,
}

/// Direct-locator tier: composite address attributes
pub const ADDRESS_LOCATORS: &[(Attribute, AddressLocators)] = &[
    (
        Attribute::PrincipalOfficeAddress,
        AddressLocators {
            line: "#MainContent_lblPOAddress",
            city: "#MainContent_lblPOAddressCity",
            state: "#MainContent_lblPOAddressState",
            zip: "#MainContent_lblPOAddressZip",
        },
    ),
    (
        Attribute::RegisteredOfficeAddress,
        AddressLocators {
            line: "#MainContent_lblROAddress",
            city: "#MainContent_lblROAddressCity",
            state: "#MainContent_lblROAddressState",
            zip: "#MainContent_lblROAddressZip",
        },
    ),
];

/// Separator between the street line and the "city, state zip" line
pub const ADDRESS_SEPARATOR: &str = " | ";

/// Table-scan tier: label keyword groups, tried in order against each label
pub const TABLE_KEYWORDS: &[(Attribute, &[&str])] = &[
    (Attribute::BusinessId, &["business id", "entity id"]),
    (Attribute::BusinessName, &["business name", "entity name"]),
    (Attribute::Type, &["entity type", "type"]),
    (Attribute::FormationDate, &["formation date"]),
    (Attribute::Jurisdiction, &["jurisdiction"]),
    (Attribute::Status, &["status"]),
    (Attribute::ResidentAgent, &["resident agent"]),
    (Attribute::LastReportingYear, &["last report"]),
    (Attribute::NextReportDueDate, &["next report"]),
    (Attribute::ForfeitureDate, &["forfeiture"]),
];

/// Text-pattern tier: ordered expressions per attribute, first match wins
///
/// Matched case-insensitively against the raw markup bytes; group 1 is the value.
pub const TEXT_PATTERNS: &[(Attribute, &[&str])] = &[
    (
        Attribute::BusinessId,
        &[r"Business ID[^>]*>([^<]+)", r"Entity ID[^>]*>([^<]+)"],
    ),
    (
        Attribute::BusinessName,
        &[r"Business Name[^>]*>([^<]+)", r"Entity Name[^>]*>([^<]+)"],
    ),
    (
        Attribute::Type,
        &[r"Entity Type[^>]*>([^<]+)", r"Type[^>]*>([^<]+)"],
    ),
    (Attribute::FormationDate, &[r"Formation Date[^>]*>([^<]+)"]),
    (Attribute::Jurisdiction, &[r"Jurisdiction[^>]*>([^<]+)"]),
    (Attribute::Status, &[r"Status[^>]*>([^<]+)"]),
    (Attribute::ResidentAgent, &[r"Resident Agent[^>]*>([^<]+)"]),
    (Attribute::LastReportingYear, &[r"Last Report[^>]*>([^<]+)"]),
    (Attribute::NextReportDueDate, &[r"Next Report[^>]*>([^<]+)"]),
    (Attribute::ForfeitureDate, &[r"Forfeiture Date[^>]*>([^<]+)"]),
];
