//! Crawl coordinator - main crawl orchestration logic
//!
//! This module drives the crawl state machine:
//! - Bootstrapping the portal session (homepage route, then direct fallback)
//! - Setting up and submitting one search per term
//! - Visiting the first rows of each result list
//! - Extracting, validating and persisting each detail view
//! - Writing the combined artifact and the run report
//!
//! Only a failed bootstrap stops a crawl. Every other failure is recorded
//! as evidence and the crawl moves on to the next row or term.

use crate::challenge::{ChallengeGate, ClearanceSignal};
use crate::config::{Config, PortalConfig};
use crate::crawler::pacing::Pacer;
use crate::crawler::portal::PortalLocators;
use crate::crawler::session::CrawlSession;
use crate::crawler::state::{CrawlPhase, ResultRow};
use crate::driver::{ElementHandle, PageDriver};
use crate::evidence::{
    combined_destination, entity_destination, error_record_destination, timestamp, EvidenceStore,
    PageSnapshot,
};
use crate::extract::FieldExtractor;
use crate::output::{CombinedResults, CrawlReport, TermReport};
use crate::record::{RecordValidator, ValidatedRecord};
use crate::{DriverError, HarvestError, Result};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure of one crawl stage; recorded, never propagated past the term
#[derive(Debug, Error)]
enum StageError {
    #[error("{0} not found")]
    Missing(&'static str),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("human verification at {0} was not cleared")]
    Challenge(String),

    #[error("row {0} is no longer in the results table")]
    RowGone(usize),

    #[error("detail page not reached after selecting {0}")]
    NotDetail(String),
}

/// Main crawler coordinator structure
pub struct CrawlCoordinator<D: PageDriver> {
    session: CrawlSession<D>,
    portal: PortalConfig,
    terms: Vec<String>,
    max_rows: usize,
    config_hash: String,
    locators: PortalLocators,
    extractor: FieldExtractor,
    validator: RecordValidator,
    pacer: Pacer,
    phase: CrawlPhase,
    history: Vec<CrawlPhase>,
    run_timestamp: String,
    started_at: DateTime<Utc>,
}

impl<D: PageDriver> CrawlCoordinator<D> {
    /// Creates a coordinator and its output layout
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawl configuration
    /// * `config_hash` - Hash of the configuration file, recorded in the combined artifact
    /// * `driver` - The page driver; owned by the crawl until teardown
    /// * `signal` - How the operator reports a cleared challenge
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlCoordinator)` - Ready to run
    /// * `Err(HarvestError)` - The output directories could not be created
    pub fn new(
        config: &Config,
        config_hash: impl Into<String>,
        driver: D,
        signal: Box<dyn ClearanceSignal>,
    ) -> Result<Self> {
        let store = EvidenceStore::open(&config.output.directory, config.output.filename_limit)?;
        let gate = ChallengeGate::new(signal, &config.timing);

        Ok(Self {
            session: CrawlSession::new(driver, gate, store),
            portal: config.portal.clone(),
            terms: config.crawl.search_terms.clone(),
            max_rows: config.crawl.max_rows_per_term,
            config_hash: config_hash.into(),
            locators: PortalLocators::default(),
            extractor: FieldExtractor::new(),
            validator: RecordValidator::new(config.output.preview_limit),
            pacer: Pacer::new(&config.timing),
            phase: CrawlPhase::Init,
            history: vec![CrawlPhase::Init],
            run_timestamp: timestamp(),
            started_at: Utc::now(),
        })
    }

    /// Replaces the default portal locators
    pub fn with_locators(mut self, locators: PortalLocators) -> Self {
        self.locators = locators;
        self
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Every phase entered so far, in order
    pub fn history(&self) -> &[CrawlPhase] {
        &self.history
    }

    pub fn session(&self) -> &CrawlSession<D> {
        &self.session
    }

    pub fn run_timestamp(&self) -> &str {
        &self.run_timestamp
    }

    /// Runs the crawl to completion
    ///
    /// Returns the run report when the terminal state is reached, however
    /// many rows failed. The session is not closed here; see [`Self::teardown`].
    pub async fn run(&mut self) -> Result<CrawlReport> {
        self.started_at = Utc::now();
        tracing::info!(
            terms = self.terms.len(),
            max_rows = self.max_rows,
            output = %self.session.store().layout().root().display(),
            "Starting crawl"
        );

        if let Err(e) = self.bootstrap().await {
            tracing::error!(error = %e, "Failed to reach the search page; stopping crawler");
            return Err(e);
        }

        let terms = self.terms.clone();
        for (index, term) in terms.iter().enumerate() {
            tracing::info!(term = %term, position = index + 1, of = terms.len(), "Starting search");
            let report = self.crawl_term(index, term).await;
            tracing::info!(
                term = %term,
                found = report.rows_found,
                saved = report.persisted,
                failed = report.failed,
                "Finished search"
            );
            self.session.add_report(report);
            self.enter(CrawlPhase::NextTerm);
        }

        self.enter(CrawlPhase::Done);
        Ok(self.finish())
    }

    /// Closes the driver session; safe to call on every exit path
    pub async fn teardown(&mut self) {
        self.session.close().await;
    }

    fn enter(&mut self, next: CrawlPhase) {
        if !self.phase.can_transition_to(next) {
            tracing::warn!(from = %self.phase, to = %next, "Unexpected phase transition");
        }
        tracing::debug!(from = %self.phase, to = %next, "Phase");
        self.phase = next;
        self.history.push(next);
    }

    // ===== Bootstrap =====

    async fn bootstrap(&mut self) -> Result<()> {
        self.enter(CrawlPhase::HomeNav);
        let primary = match self.homepage_route().await {
            Ok(()) => return Ok(()),
            Err(StageError::Challenge(url)) => return Err(self.abort_on_challenge(url)),
            Err(e) => HarvestError::NavigationFailed {
                url: self.portal.home_url.clone(),
                reason: e.to_string(),
            },
        };

        tracing::warn!(error = %primary, "Homepage route failed; trying direct navigation");
        self.enter(CrawlPhase::SearchNav);
        match self.open_search_page().await {
            Ok(()) => {
                tracing::info!("Used direct navigation fallback");
                Ok(())
            }
            Err(StageError::Challenge(url)) => Err(self.abort_on_challenge(url)),
            Err(e) => {
                let fallback = HarvestError::NavigationFailed {
                    url: self.portal.search_url.clone(),
                    reason: e.to_string(),
                };
                self.enter(CrawlPhase::Aborted);
                Err(HarvestError::Bootstrap {
                    primary: primary.to_string(),
                    fallback: fallback.to_string(),
                })
            }
        }
    }

    async fn homepage_route(&mut self) -> std::result::Result<(), StageError> {
        let home = self.portal.home_url.clone();
        self.session.driver_mut().navigate(&home).await?;
        self.pacer.settle().await;
        if let Ok(title) = self.session.driver().title().await {
            tracing::info!(title = %title, "Homepage loaded");
        }
        self.pass_gate().await?;

        self.enter(CrawlPhase::SearchNav);
        self.open_search_page().await?;
        tracing::info!("Navigated from homepage to search page");
        Ok(())
    }

    fn abort_on_challenge(&mut self, url: String) -> HarvestError {
        self.enter(CrawlPhase::Aborted);
        HarvestError::ChallengeTimedOut { url }
    }

    async fn open_search_page(&mut self) -> std::result::Result<(), StageError> {
        let search = self.portal.search_url.clone();
        self.session.driver_mut().navigate(&search).await?;
        self.pacer.settle().await;
        self.pass_gate().await
    }

    async fn pass_gate(&mut self) -> std::result::Result<(), StageError> {
        if self.session.pass_gate().await.is_passable() {
            Ok(())
        } else {
            Err(StageError::Challenge(self.session.driver().current_url()))
        }
    }

    // ===== Per Term =====

    async fn crawl_term(&mut self, index: usize, term: &str) -> TermReport {
        let mut report = TermReport::new(term);
        self.session.begin_term(term);

        if index > 0 {
            self.enter(CrawlPhase::SearchNav);
            if let Err(e) = self.open_search_page().await {
                self.record_failure(term, &format!("Failed to navigate to search page: {}", e))
                    .await;
                report.skip("search page unreachable");
                return report;
            }
        }

        self.enter(CrawlPhase::SetupQuery);
        if let Err(e) = self.setup_query(term).await {
            self.record_failure(term, &format!("Search setup failed: {}", e)).await;
            report.skip("search setup failed");
            return report;
        }

        self.enter(CrawlPhase::Submit);
        if let Err(e) = self.submit_search().await {
            self.record_failure(term, &format!("Search failed: {}", e)).await;
            report.skip("search failed");
            return report;
        }

        self.enter(CrawlPhase::ResultList);
        let rows = match self.resolve_rows().await {
            Ok(rows) => rows,
            Err(e) => {
                self.record_failure(term, &format!("Business links extraction error: {}", e))
                    .await;
                report.skip("results unreadable");
                return report;
            }
        };
        report.rows_found = rows.len();
        if rows.is_empty() {
            tracing::warn!(term = %term, "No businesses found");
            report.skip("no results");
            return report;
        }
        tracing::info!(term = %term, rows = rows.len(), "Found businesses");

        let take = rows.len().min(self.max_rows);
        self.session.state_mut().rows = rows;

        for cursor in 0..take {
            self.session.state_mut().cursor = cursor;
            let Some(row) = self.session.state().current_row().cloned() else {
                break;
            };

            if cursor > 0 {
                self.enter(CrawlPhase::ReturnToList);
                if let Err(e) = self.ensure_result_list().await {
                    self.record_failure(term, &format!("Error returning to results: {}", e))
                        .await;
                    report.skip("result list lost");
                    break;
                }
            }

            report.rows_attempted += 1;
            tracing::info!(
                term = %term,
                row = cursor + 1,
                of = take,
                name = %row.display_name,
                id = %row.external_id,
                "Opening business"
            );

            self.enter(CrawlPhase::DetailNav);
            if let Err(e) = self.open_detail(&row).await {
                self.record_failure(
                    term,
                    &format!("Failed to open detail page for {}: {}", row.display_name, e),
                )
                .await;
                report.failed += 1;
                continue;
            }

            self.enter(CrawlPhase::Extract);
            let (record, page) = self.extract_record(term).await;

            self.enter(CrawlPhase::Persist);
            if self.persist_record(record, term, &page) {
                report.persisted += 1;
            } else {
                report.failed += 1;
            }
        }

        report
    }

    async fn setup_query(&mut self, term: &str) -> std::result::Result<(), StageError> {
        let radios = [
            self.locators.search_type_radio.clone(),
            self.locators.name_mode_radio.clone(),
        ];
        for selector in &radios {
            let driver = self.session.driver_mut();
            if let Some(radio) = driver.query_one(selector).await? {
                if !driver.is_checked(radio).await? {
                    driver.click(radio).await?;
                    tracing::debug!(selector = %selector, "Selected search option");
                }
            }
        }

        let field = self.locators.query_field.clone();
        let driver = self.session.driver_mut();
        let input = driver
            .query_one(&field)
            .await?
            .ok_or(StageError::Missing("search input"))?;
        driver.fill(input, "").await?;
        driver.fill(input, term).await?;
        tracing::debug!(term = %term, "Entered search term");
        Ok(())
    }

    async fn submit_search(&mut self) -> std::result::Result<(), StageError> {
        self.pass_gate().await?;

        let selector = self.locators.search_button.clone();
        let driver = self.session.driver_mut();
        let button = driver
            .query_one(&selector)
            .await?
            .ok_or(StageError::Missing("search button"))?;
        driver.click(button).await?;
        self.pacer.settle().await;

        self.pass_gate().await
    }

    /// Reads the visible result rows, skipping the header row
    async fn resolve_rows(&self) -> std::result::Result<Vec<ResultRow>, StageError> {
        let driver = self.session.driver();
        let Some(table) = driver.query_one(&self.locators.results_table).await? else {
            tracing::warn!("No results table found");
            return Ok(Vec::new());
        };

        let mut rows = Vec::new();
        for (position_index, row) in driver.query_within(table, "tr").await?.into_iter().enumerate().skip(1) {
            match read_row(driver, row, position_index).await {
                Ok(Some(found)) => rows.push(found),
                Ok(None) => {}
                Err(e) => tracing::warn!(row = position_index, error = %e, "Error processing row"),
            }
        }
        Ok(rows)
    }

    /// Re-resolves `row` in the live table and opens its detail view
    async fn open_detail(&mut self, row: &ResultRow) -> std::result::Result<(), StageError> {
        let locators = self.locators.clone();
        let driver = self.session.driver_mut();

        let table = driver
            .query_one(&locators.results_table)
            .await?
            .ok_or(StageError::Missing("results table"))?;
        let live_rows = driver.query_within(table, "tr").await?;
        let target = *live_rows
            .get(row.position_index)
            .ok_or(StageError::RowGone(row.position_index))?;
        let select = driver
            .query_within(target, &locators.select_control)
            .await?
            .into_iter()
            .next()
            .ok_or(StageError::Missing("select business control"))?;

        driver.click(select).await?;
        self.pacer.settle().await;
        self.pass_gate().await?;

        match self.session.driver().query_one(&locators.detail_marker).await? {
            Some(_) => Ok(()),
            None => Err(StageError::NotDetail(row.display_name.clone())),
        }
    }

    /// Makes sure the result list is displayed, going back if needed
    async fn ensure_result_list(&mut self) -> std::result::Result<(), StageError> {
        let locators = self.locators.clone();
        if self.session.driver().query_one(&locators.results_table).await?.is_some() {
            return Ok(());
        }

        let driver = self.session.driver_mut();
        match driver.query_one(&locators.return_control).await? {
            Some(control) => driver.click(control).await?,
            None => driver.go_back().await?,
        }
        self.pacer.settle().await;
        self.pass_gate().await?;

        match self.session.driver().query_one(&locators.results_table).await? {
            Some(_) => Ok(()),
            None => Err(StageError::Missing("results table")),
        }
    }

    async fn extract_record(&mut self, term: &str) -> (ValidatedRecord, PageSnapshot) {
        let page = self.session.snapshot().await;
        if page.markup().is_none() {
            let record = self.validator.extraction_failure(
                "Detail page markup unavailable",
                term,
                &page,
                self.session.store(),
            );
            return (record, page);
        }

        let fields = self.extractor.extract(self.session.driver()).await;
        let record = self
            .validator
            .validate(fields, term, &page, self.session.store());
        (record, page)
    }

    /// Writes one record; true when a success record landed as structured JSON
    fn persist_record(&mut self, record: ValidatedRecord, term: &str, page: &PageSnapshot) -> bool {
        let store = self.session.store();
        let limit = store.filename_limit();
        let destination = match &record {
            ValidatedRecord::Success(entity) => entity_destination(&entity.business_name(), limit),
            ValidatedRecord::Error(error) => {
                error_record_destination(error.status.as_str(), term, limit)
            }
        };
        let location = store.persist(&record, &destination, page);

        match record {
            ValidatedRecord::Success(entity) if location.is_structured() => {
                tracing::info!(
                    name = %entity.business_name(),
                    id = %entity.business_id(),
                    path = %location,
                    "Saved business"
                );
                self.session.add_record(entity);
                true
            }
            other => {
                tracing::warn!(term = %term, status = %other.status(), path = %location, "Saved with errors");
                false
            }
        }
    }

    async fn record_failure(&mut self, term: &str, message: &str) {
        tracing::error!(term = %term, url = %self.session.driver().current_url(), "{}", message);
        let page = self.session.snapshot().await;
        self.session.store().record_error(term, message, Some(&page));
    }

    // ===== Completion =====

    fn finish(&self) -> CrawlReport {
        let records = self.session.records();
        let combined = if records.is_empty() {
            tracing::warn!("No businesses were successfully extracted");
            None
        } else {
            let results = CombinedResults::new(records, &self.terms, &self.config_hash, Utc::now());
            let page = PageSnapshot::unavailable(self.session.driver().current_url());
            let location = self.session.store().persist(
                &results,
                &combined_destination(&self.run_timestamp),
                &page,
            );
            tracing::info!(total = records.len(), path = %location, "Combined results saved");
            Some(location)
        };

        CrawlReport {
            run_timestamp: self.run_timestamp.clone(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            config_hash: self.config_hash.clone(),
            terms: self.session.reports().to_vec(),
            total_successes: records.len(),
            challenges_seen: self.session.gate().challenges_seen(),
            combined,
            layout: self.session.store().layout().clone(),
        }
    }
}

/// Reads one result row; `None` for rows that are not selectable entries
async fn read_row<D: PageDriver + ?Sized>(
    driver: &D,
    row: ElementHandle,
    position_index: usize,
) -> std::result::Result<Option<ResultRow>, DriverError> {
    let cells = driver.query_within(row, "td").await?;
    if cells.len() < 3 {
        return Ok(None);
    }
    let external_id = driver.text_content(cells[0]).await?.trim().to_string();
    let display_name = driver.text_content(cells[1]).await?.trim().to_string();
    if display_name.chars().count() <= 1 {
        return Ok(None);
    }
    Ok(Some(ResultRow {
        display_name,
        external_id,
        position_index,
    }))
}
