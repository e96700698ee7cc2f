//! Output module for run-level artifacts and summaries
//!
//! This module handles:
//! - The combined results artifact of a run
//! - Per-term and per-run crawl reports
//! - Console and markdown summaries

mod combined;
mod markdown;
mod report;

pub use combined::CombinedResults;
pub use markdown::{format_markdown_summary, summary_file_name, write_markdown_summary};
pub use report::{print_report, CrawlReport, TermReport};

use thiserror::Error;

/// Output-specific errors
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for output operations
pub type OutputResult<T> = Result<T, OutputError>;
