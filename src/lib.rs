//! Registry-Harvest: a resilient crawler for business-registry search portals
//!
//! This crate drives a stateful, session-bound registry UI through a
//! [`driver::PageDriver`], extracts a fixed schema of entity attributes from
//! each detail view, and persists structured records while never losing the
//! raw page evidence when structuring fails.

pub mod challenge;
pub mod config;
pub mod crawler;
pub mod driver;
pub mod evidence;
pub mod extract;
pub mod output;
pub mod record;

use thiserror::Error;

/// Main error type for Registry-Harvest operations
///
/// Only bootstrap navigation failures, interrupts, and unusable configuration
/// reach the caller of a crawl; everything else is converted into evidence.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Page driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("Could not reach the search page (homepage route: {primary}; direct route: {fallback})")]
    Bootstrap { primary: String, fallback: String },

    #[error("Human verification at {url} was not cleared in time")]
    ChallengeTimedOut { url: String },

    #[error("Crawl interrupted by operator")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised by a page driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Element handle is stale (page changed since it was resolved)")]
    StaleElement,

    #[error("No page loaded")]
    NoDocument,

    #[error("No previous page in history")]
    NoHistory,

    #[error("Element cannot be submitted: {0}")]
    NotAForm(String),

    #[error("URL error: {0}")]
    Url(#[from] ::url::ParseError),
}

/// Result type alias for Registry-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for page driver operations
pub type DriverResult<T> = std::result::Result<T, DriverError>;

// Re-export commonly used types
pub use challenge::{ChallengeGate, GateOutcome};
pub use config::Config;
pub use crawler::{run_crawl, CrawlCoordinator, CrawlPhase, CrawlSession};
pub use driver::{HttpDriver, PageDriver};
pub use evidence::{ArtifactLocation, EvidenceStore};
pub use extract::{Attribute, FieldExtractor};
pub use record::{EntityRecord, RecordStatus, RecordValidator, ValidatedRecord};
