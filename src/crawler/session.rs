//! Crawl session
//!
//! Owns the single-owner resources of a crawl: the page driver, the
//! challenge gate, the evidence store, and the accumulated results.

use crate::challenge::{ChallengeGate, GateOutcome};
use crate::crawler::state::CrawlState;
use crate::driver::PageDriver;
use crate::evidence::{EvidenceStore, PageSnapshot};
use crate::output::TermReport;
use crate::record::EntityRecord;

pub struct CrawlSession<D: PageDriver> {
    driver: D,
    gate: ChallengeGate,
    store: EvidenceStore,
    state: CrawlState,
    records: Vec<EntityRecord>,
    reports: Vec<TermReport>,
    closed: bool,
}

impl<D: PageDriver> CrawlSession<D> {
    pub fn new(driver: D, gate: ChallengeGate, store: EvidenceStore) -> Self {
        Self {
            driver,
            gate,
            store,
            state: CrawlState::default(),
            records: Vec::new(),
            reports: Vec::new(),
            closed: false,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn store(&self) -> &EvidenceStore {
        &self.store
    }

    pub fn gate(&self) -> &ChallengeGate {
        &self.gate
    }

    /// Runs the challenge gate against the current page
    pub async fn pass_gate(&mut self) -> GateOutcome {
        self.gate.check(&self.driver).await
    }

    /// Snapshot of the current page for evidence
    pub async fn snapshot(&self) -> PageSnapshot {
        PageSnapshot::capture(&self.driver).await
    }

    /// Discards the previous term's state and starts `term`
    pub fn begin_term(&mut self, term: &str) -> &mut CrawlState {
        self.state = CrawlState::new(term);
        &mut self.state
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CrawlState {
        &mut self.state
    }

    pub fn add_record(&mut self, record: EntityRecord) {
        self.state.successes += 1;
        self.records.push(record);
    }

    pub fn records(&self) -> &[EntityRecord] {
        &self.records
    }

    pub fn add_report(&mut self, report: TermReport) {
        self.reports.push(report);
    }

    pub fn reports(&self) -> &[TermReport] {
        &self.reports
    }

    /// Releases the driver session; later calls do nothing
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match self.driver.close().await {
            Ok(()) => tracing::info!("Browser session closed"),
            Err(e) => tracing::warn!(error = %e, "Failed to close browser session cleanly"),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
