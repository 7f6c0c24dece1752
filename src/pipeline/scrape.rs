// src/pipeline/scrape.rs

//! Link discovery and product scraping stages.

use crate::browser::PageDriver;
use crate::error::Result;
use crate::models::{Config, ScrapeResult};
use crate::services::{LinkCollector, ProductScraper, ScrapeReport};
use crate::storage::{ResultStorage, WriteMetadata};

/// Collect product links from the configured listing page.
pub async fn run_links(config: &Config, driver: &dyn PageDriver) -> Result<Vec<String>> {
    let collector = LinkCollector::new(&config.scraper, &config.selectors.listing);
    collector.collect(driver, &config.scraper.scrape_url).await
}

/// Discover links and scrape every product page.
///
/// Only discovery failures are errors; individual pages are skipped.
pub async fn run_scrape(config: &Config, driver: &dyn PageDriver) -> Result<ScrapeReport> {
    let links = run_links(config, driver).await?;
    let scraper = ProductScraper::new(&config.scraper, &config.selectors.product);
    Ok(scraper.scrape_all(driver, &links).await)
}

/// Persist a scrape report as the artifact, even when it holds no products.
pub async fn write_report(
    storage: &dyn ResultStorage,
    report: &ScrapeReport,
) -> Result<WriteMetadata> {
    let result = ScrapeResult::new(report.links_found, report.products.clone());
    storage.write_result(&result).await
}
