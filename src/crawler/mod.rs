//! Crawler module for driving the registry portal
//!
//! This module contains the core crawling logic, including:
//! - The crawl phase state machine and per-term state
//! - The session owning the driver, challenge gate and evidence store
//! - Portal locators and settle pacing
//! - Overall crawl coordination

mod coordinator;
mod pacing;
mod portal;
mod session;
mod state;

pub use coordinator::CrawlCoordinator;
pub use pacing::Pacer;
pub use portal::PortalLocators;
pub use session::CrawlSession;
pub use state::{CrawlPhase, CrawlState, ResultRow};

use crate::driver::PageDriver;
use crate::output::CrawlReport;
use crate::{HarvestError, Result};
use std::future::Future;

/// Runs a complete crawl, honoring an operator interrupt
///
/// The crawl races `shutdown`; whichever finishes first wins, and the
/// driver session is closed afterwards on every path (completion,
/// bootstrap abort, or interrupt).
///
/// # Arguments
///
/// * `coordinator` - A coordinator built for this run
/// * `shutdown` - Resolves when the operator asks the crawl to stop
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl reached its terminal state
/// * `Err(HarvestError::Interrupted)` - `shutdown` resolved first
/// * `Err(HarvestError)` - The search page could not be reached
pub async fn run_crawl<D, F>(coordinator: &mut CrawlCoordinator<D>, shutdown: F) -> Result<CrawlReport>
where
    D: PageDriver,
    F: Future<Output = ()>,
{
    let outcome = tokio::select! {
        result = coordinator.run() => result,
        _ = shutdown => Err(HarvestError::Interrupted),
    };

    if matches!(outcome, Err(HarvestError::Interrupted)) {
        tracing::warn!(phase = %coordinator.phase(), "Interrupt received; stopping crawl");
    }

    coordinator.teardown().await;
    outcome
}
