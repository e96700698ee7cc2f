//! Markdown run summary
//!
//! Written next to the combined artifact so an operator can review a run
//! without reading the session log.

use crate::output::{CrawlReport, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of `report` to `output_path`
///
/// # Arguments
///
/// * `report` - The finished crawl
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn write_markdown_summary(report: &CrawlReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Name of the summary file for a run
pub fn summary_file_name(run_timestamp: &str) -> String {
    format!("summary_{}.md", run_timestamp)
}

/// Formats a crawl report as markdown
pub fn format_markdown_summary(report: &CrawlReport) -> String {
    let mut md = String::new();

    md.push_str("# Registry Harvest Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run**: {}\n", report.run_timestamp));
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {} seconds\n",
        report.duration_seconds()
    ));
    md.push_str(&format!("- **Config Hash**: {}\n\n", report.config_hash));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!(
        "- **Companies Collected**: {}\n",
        report.total_successes
    ));
    md.push_str(&format!(
        "- **Rows Attempted**: {}\n",
        report.total_rows_attempted()
    ));
    md.push_str(&format!("- **Rows Failed**: {}\n", report.total_failed()));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        report.success_rate()
    ));
    md.push_str(&format!(
        "- **Challenges Cleared**: {}\n\n",
        report.challenges_seen
    ));

    md.push_str("## Search Terms\n\n");
    md.push_str("| Term | Found | Attempted | Saved | Failed | Note |\n");
    md.push_str("|------|-------|-----------|-------|--------|------|\n");
    for term in &report.terms {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            term.term,
            term.rows_found,
            term.rows_attempted,
            term.persisted,
            term.failed,
            term.skipped_reason.as_deref().unwrap_or("")
        ));
    }
    md.push('\n');

    md.push_str("## Artifacts\n\n");
    match &report.combined {
        Some(location) => md.push_str(&format!("- **Combined Results**: `{}`\n", location)),
        None => md.push_str("- **Combined Results**: none\n"),
    }
    md.push_str(&format!(
        "- **Records**: `{}`\n",
        report.layout.json().display()
    ));
    md.push_str(&format!(
        "- **Errors**: `{}`\n",
        report.layout.errors().display()
    ));
    md.push_str(&format!(
        "- **HTML Fallbacks**: `{}`\n",
        report.layout.html_fallback().display()
    ));
    md.push_str(&format!(
        "- **Session Log**: `{}`\n",
        report.layout.log_file().display()
    ));

    md
}
