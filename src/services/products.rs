// src/services/products.rs

//! Product page scraper.
//!
//! Reads each field independently, then validates the whole record. Any
//! failure for one page becomes a skip; it never aborts the run.

use std::fmt;
use std::time::Duration;

use chrono::Utc;

use crate::browser::PageDriver;
use crate::error::AppError;
use crate::models::{Product, ProductCandidate, ProductSelectors, ScraperConfig, Violations};
use crate::utils::resolve;

/// Why a product page produced no record.
#[derive(Debug)]
pub enum SkipReason {
    /// Navigation failed or timed out
    Unreachable(AppError),
    /// The page loaded but its name marker never appeared
    MissingMarker(AppError),
    /// Fields were read but the record failed validation
    Invalid(Violations),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unreachable(e) => write!(f, "page did not load: {e}"),
            SkipReason::MissingMarker(e) => write!(f, "name marker missing: {e}"),
            SkipReason::Invalid(v) => write!(f, "validation failed: {v}"),
        }
    }
}

/// Result of scraping one product page.
#[derive(Debug)]
pub enum ScrapeOutcome {
    Scraped(Product),
    Skipped(SkipReason),
}

/// Products scraped from a set of links.
#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub links_found: usize,
    pub products: Vec<Product>,
    pub skipped: usize,
}

/// Extracts validated products from product pages.
pub struct ProductScraper {
    selectors: ProductSelectors,
    site_base_url: String,
    page_timeout: Duration,
    selector_timeout: Duration,
}

impl ProductScraper {
    pub fn new(config: &ScraperConfig, selectors: &ProductSelectors) -> Self {
        Self {
            selectors: selectors.clone(),
            site_base_url: config.site_base_url.clone(),
            page_timeout: config.listing_timeout(),
            selector_timeout: config.selector_timeout(),
        }
    }

    /// Scrape every link in order, collecting products and counting skips.
    pub async fn scrape_all(&self, driver: &dyn PageDriver, links: &[String]) -> ScrapeReport {
        let mut report = ScrapeReport {
            links_found: links.len(),
            ..ScrapeReport::default()
        };

        for (index, link) in links.iter().enumerate() {
            log::debug!("[{}/{}] {}", index + 1, links.len(), link);
            match self.scrape(driver, link).await {
                ScrapeOutcome::Scraped(product) => report.products.push(product),
                ScrapeOutcome::Skipped(reason) => {
                    log::warn!("Skipping {link}: {reason}");
                    report.skipped += 1;
                }
            }
        }

        log::info!(
            "Scraping complete: {} links, {} scraped, {} skipped",
            report.links_found,
            report.products.len(),
            report.skipped
        );
        report
    }

    /// Scrape a single product page.
    pub async fn scrape(&self, driver: &dyn PageDriver, product_url: &str) -> ScrapeOutcome {
        log::info!("Scraping product page {product_url}");

        if let Err(e) = driver.navigate(product_url, self.page_timeout).await {
            return ScrapeOutcome::Skipped(SkipReason::Unreachable(e));
        }
        if let Err(e) = driver
            .wait_for_selector(&self.selectors.name, self.selector_timeout)
            .await
        {
            return ScrapeOutcome::Skipped(SkipReason::MissingMarker(e));
        }

        let candidate = self.read_candidate(driver, product_url).await;
        match candidate.validate() {
            Ok(product) => {
                log::info!("Product scraped: {}", product.name());
                ScrapeOutcome::Scraped(product)
            }
            Err(violations) => ScrapeOutcome::Skipped(SkipReason::Invalid(violations)),
        }
    }

    async fn read_candidate(&self, driver: &dyn PageDriver, product_url: &str) -> ProductCandidate {
        let name = first_text(driver, &self.selectors.name).await;
        let price = first_text(driver, &self.selectors.price).await;
        let catalog_number = first_text(driver, &self.selectors.catalog_number).await;

        let description = match driver.texts(&self.selectors.description).await {
            Ok(parts) => parts
                .into_iter()
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                log::debug!("description unreadable on {product_url}: {e}");
                String::new()
            }
        };

        let image_url = match driver.first_attribute(&self.selectors.image, "src").await {
            Ok(Some(src)) if !src.trim().is_empty() => resolve(&self.site_base_url, src.trim()),
            Ok(_) => String::new(),
            Err(e) => {
                log::debug!("image unreadable on {product_url}: {e}");
                String::new()
            }
        };

        ProductCandidate {
            catalog_number,
            name,
            description,
            price,
            image_url,
            product_url: product_url.to_string(),
            scraped_at: Utc::now(),
        }
    }
}

/// First matching element's text, or empty when absent or unreadable.
async fn first_text(driver: &dyn PageDriver, selector: &str) -> String {
    match driver.first_text(selector).await {
        Ok(text) => text.unwrap_or_default(),
        Err(e) => {
            log::debug!("field '{selector}' unreadable: {e}");
            String::new()
        }
    }
}
