//! Pipeline entry points for catalog sync operations.
//!
//! - `run_links`: Discover product links on the listing page
//! - `run_scrape`: Discover links and scrape every product page
//! - `run_sync` / `run_dry_run`: Reconcile a stored artifact with the store
//! - `run_pipeline`: Scrape, persist, then sync in one run

pub mod scrape;
pub mod sync;

pub use scrape::{run_links, run_scrape, write_report};
pub use sync::{SyncPlan, plan_all, run_dry_run, run_sync};

use crate::browser::PageDriver;
use crate::error::Result;
use crate::models::{Config, SyncSummary};
use crate::remote::CatalogStore;
use crate::services::SyncEngine;
use crate::storage::{ResultStorage, WriteMetadata};

/// Counts from a full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub links_found: usize,
    pub scraped: usize,
    pub skipped: usize,
    pub written: WriteMetadata,
    /// `None` when the sync stage was skipped
    pub sync: Option<SyncSummary>,
}

/// Run discovery, scraping, persistence and (optionally) sync.
///
/// The driver is closed before returning, whether or not the run succeeded.
pub async fn run_pipeline<S: CatalogStore>(
    config: &Config,
    driver: &dyn PageDriver,
    storage: &dyn ResultStorage,
    engine: Option<&SyncEngine<S>>,
) -> Result<PipelineReport> {
    let result = run_stages(config, driver, storage, engine).await;
    close_driver(driver).await;
    result
}

/// Close the driver, logging instead of failing.
pub async fn close_driver(driver: &dyn PageDriver) {
    match driver.close().await {
        Ok(()) => log::info!("Browser closed"),
        Err(e) => log::warn!("Failed to close browser: {e}"),
    }
}

async fn run_stages<S: CatalogStore>(
    config: &Config,
    driver: &dyn PageDriver,
    storage: &dyn ResultStorage,
    engine: Option<&SyncEngine<S>>,
) -> Result<PipelineReport> {
    log::info!("Starting scraper for {}", config.scraper.scrape_url);

    let report = run_scrape(config, driver).await?;
    let written = write_report(storage, &report).await?;

    let sync = match engine {
        Some(engine) => Some(engine.sync_all(&report.products).await),
        None => {
            log::info!("Skipping WooCommerce sync");
            None
        }
    };

    let summary = PipelineReport {
        links_found: report.links_found,
        scraped: report.products.len(),
        skipped: report.skipped,
        written,
        sync,
    };
    match &summary.sync {
        Some(sync) => log::info!(
            "Scrape and sync complete: {} found, {} scraped, {} skipped; {} created, {} updated, {} failed",
            summary.links_found,
            summary.scraped,
            summary.skipped,
            sync.total.created,
            sync.total.updated,
            sync.total.failed
        ),
        None => log::info!(
            "Scrape complete: {} found, {} scraped, {} skipped",
            summary.links_found,
            summary.scraped,
            summary.skipped
        ),
    }
    Ok(summary)
}
