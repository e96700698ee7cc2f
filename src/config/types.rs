use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Registry-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub portal: PortalConfig,
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

/// Where the registry portal lives
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Landing page visited first to establish a session
    #[serde(rename = "home-url")]
    pub home_url: String,

    /// The business search form
    #[serde(rename = "search-url")]
    pub search_url: String,
}

/// What to search for and how much of each result list to visit
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Search terms, consumed in order, one crawl pass each
    #[serde(rename = "search-terms")]
    pub search_terms: Vec<String>,

    /// Detail pages opened per search term
    #[serde(rename = "max-rows-per-term", default = "default_max_rows")]
    pub max_rows_per_term: usize,
}

/// Settle delays between navigation steps (milliseconds)
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Fixed delay after each navigation step
    #[serde(rename = "settle-ms", default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Upper bound of the uniform random delay added to `settle_ms`
    #[serde(rename = "jitter-ms", default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Delay after a human verification challenge is cleared
    #[serde(rename = "challenge-settle-ms", default = "default_challenge_settle_ms")]
    pub challenge_settle_ms: u64,

    /// Bound on waiting for challenge clearance; 0 waits indefinitely
    #[serde(rename = "challenge-timeout-secs", default)]
    pub challenge_timeout_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory for records, evidence, and the session log
    pub directory: PathBuf,

    /// Maximum length of the sanitized identifier in artifact names
    #[serde(rename = "filename-limit", default = "default_filename_limit")]
    pub filename_limit: usize,

    /// Maximum length of the data preview kept in serialization error records
    #[serde(rename = "preview-limit", default = "default_preview_limit")]
    pub preview_limit: usize,
}

/// Browser identity presented to the portal
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl TimingConfig {
    /// Timing with every delay disabled
    pub fn immediate() -> Self {
        Self {
            settle_ms: 0,
            jitter_ms: 0,
            challenge_settle_ms: 0,
            challenge_timeout_secs: 0,
        }
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }

    pub fn challenge_settle(&self) -> Duration {
        Duration::from_millis(self.challenge_settle_ms)
    }

    /// `None` means wait for the operator indefinitely
    pub fn challenge_timeout(&self) -> Option<Duration> {
        (self.challenge_timeout_secs > 0).then(|| Duration::from_secs(self.challenge_timeout_secs))
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            jitter_ms: default_jitter_ms(),
            challenge_settle_ms: default_challenge_settle_ms(),
            challenge_timeout_secs: 0,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
        }
    }
}

fn default_max_rows() -> usize {
    3
}

fn default_settle_ms() -> u64 {
    3000
}

fn default_jitter_ms() -> u64 {
    2000
}

fn default_challenge_settle_ms() -> u64 {
    3000
}

fn default_filename_limit() -> usize {
    30
}

fn default_preview_limit() -> usize {
    500
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}
