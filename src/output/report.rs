//! Crawl reports and the console summary

use crate::evidence::{ArtifactLocation, OutputLayout};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one search term
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TermReport {
    pub term: String,

    /// Result rows visible after the search
    pub rows_found: usize,

    /// Rows whose detail view was attempted
    pub rows_attempted: usize,

    /// Success records written as structured JSON
    pub persisted: usize,

    /// Rows that ended in an error record or a logged failure
    pub failed: usize,

    /// Why the term stopped early, if it did
    pub skipped_reason: Option<String>,
}

impl TermReport {
    pub fn new(term: &str) -> Self {
        Self {
            term: term.to_string(),
            ..Self::default()
        }
    }

    pub fn skip(&mut self, reason: impl Into<String>) {
        self.skipped_reason = Some(reason.into());
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped_reason.is_some()
    }
}

/// Summary of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub run_timestamp: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: String,
    pub terms: Vec<TermReport>,
    pub total_successes: usize,
    pub challenges_seen: usize,
    /// Combined artifact; absent when nothing succeeded
    pub combined: Option<ArtifactLocation>,
    pub layout: OutputLayout,
}

impl CrawlReport {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    pub fn total_rows_attempted(&self) -> usize {
        self.terms.iter().map(|t| t.rows_attempted).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.terms.iter().map(|t| t.failed).sum()
    }

    /// Percentage of attempted rows that produced a success record
    pub fn success_rate(&self) -> f64 {
        let attempted = self.total_rows_attempted();
        if attempted == 0 {
            return 0.0;
        }
        (self.total_successes as f64 / attempted as f64) * 100.0
    }

    pub fn term(&self, term: &str) -> Option<&TermReport> {
        self.terms.iter().find(|t| t.term == term)
    }
}

/// Prints the crawl summary to stdout
///
/// # Arguments
///
/// * `report` - The finished crawl
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Summary ===\n");

    println!("Overview:");
    println!("  Companies collected: {}", report.total_successes);
    println!("  Rows attempted: {}", report.total_rows_attempted());
    println!("  Rows failed: {}", report.total_failed());
    println!("  Success rate: {:.1}%", report.success_rate());
    println!("  Challenges cleared: {}", report.challenges_seen);
    println!("  Duration: {}s", report.duration_seconds());
    println!();

    println!("Search Terms:");
    for term in &report.terms {
        match &term.skipped_reason {
            Some(reason) => println!(
                "  {}: {} found, {} saved, {} failed (stopped: {})",
                term.term, term.rows_found, term.persisted, term.failed, reason
            ),
            None => println!(
                "  {}: {} found, {} saved, {} failed",
                term.term, term.rows_found, term.persisted, term.failed
            ),
        }
    }
    println!();

    match &report.combined {
        Some(location) => println!("Combined results: {}", location),
        None => println!("Combined results: none (no successful extractions)"),
    }
    println!("Records:        {}", report.layout.json().display());
    println!("Errors:         {}", report.layout.errors().display());
    println!("HTML fallbacks: {}", report.layout.html_fallback().display());
    println!("Session log:    {}", report.layout.log_file().display());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(terms: Vec<TermReport>, successes: usize) -> CrawlReport {
        let now = Utc::now();
        CrawlReport {
            run_timestamp: "20240305_143000".to_string(),
            started_at: now,
            finished_at: now,
            config_hash: "abc".to_string(),
            terms,
            total_successes: successes,
            challenges_seen: 0,
            combined: None,
            layout: OutputLayout::new("out"),
        }
    }

    #[test]
    fn test_totals() {
        let mut aa = TermReport::new("AA");
        aa.rows_found = 10;
        aa.rows_attempted = 3;
        aa.persisted = 2;
        aa.failed = 1;
        let mut zzz = TermReport::new("ZZZ");
        zzz.skip("no results");

        let report = report(vec![aa, zzz], 2);
        assert_eq!(report.total_rows_attempted(), 3);
        assert_eq!(report.total_failed(), 1);
        assert!((report.success_rate() - 66.666).abs() < 0.01);
        assert!(report.term("ZZZ").unwrap().is_skipped());
    }

    #[test]
    fn test_success_rate_without_attempts() {
        assert_eq!(report(vec![], 0).success_rate(), 0.0);
    }
}
