// src/services/links.rs

//! Product link discovery on a paginated listing page.

use std::collections::HashSet;
use std::time::Duration;

use url::Url;

use crate::browser::{ElementQuery, PageDriver, wait_until};
use crate::error::{AppError, Result};
use crate::models::{ListingSelectors, ScraperConfig};
use crate::utils::resolve_url;

/// Why pagination stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pagination {
    /// Keep clicking
    More,
    /// No control, no new content, or the round cap was hit
    Done,
}

/// Collects product links by clicking "load more" until the listing is exhausted.
pub struct LinkCollector {
    product_link: String,
    load_more: ElementQuery,
    listing_timeout: Duration,
    selector_timeout: Duration,
    load_more_timeout: Duration,
    network_idle_timeout: Duration,
    poll_interval: Duration,
    max_rounds: usize,
}

impl LinkCollector {
    pub fn new(config: &ScraperConfig, selectors: &ListingSelectors) -> Self {
        Self {
            product_link: selectors.product_link.clone(),
            load_more: ElementQuery::with_text(
                &selectors.load_more_selector,
                &selectors.load_more_text,
            ),
            listing_timeout: config.listing_timeout(),
            selector_timeout: config.selector_timeout(),
            load_more_timeout: config.load_more_timeout(),
            network_idle_timeout: config.network_idle_timeout(),
            poll_interval: config.poll_interval(),
            max_rounds: config.max_load_more_rounds,
        }
    }

    /// Return the deduplicated product URLs reachable from `url`, in first-seen order.
    ///
    /// Fails only when the listing itself does not load or never shows a
    /// product link.
    pub async fn collect(&self, driver: &dyn PageDriver, url: &str) -> Result<Vec<String>> {
        let base = Url::parse(url)?;

        log::info!("Navigating to category page {url}");
        driver
            .navigate(url, self.listing_timeout)
            .await
            .map_err(|e| AppError::discovery(format!("listing {url} did not load: {e}")))?;
        driver
            .wait_for_selector(&self.product_link, self.selector_timeout)
            .await
            .map_err(|e| AppError::discovery(format!("no product links on {url}: {e}")))?;

        let mut rounds = 0;
        while rounds < self.max_rounds {
            if self.load_more_round(driver, rounds + 1).await? == Pagination::Done {
                break;
            }
            rounds += 1;
        }
        if rounds == self.max_rounds {
            log::warn!("Stopped after {rounds} load-more rounds (cap reached)");
        }

        let hrefs = driver.attributes(&self.product_link, "href").await?;
        let links = dedupe(hrefs.iter().map(|href| resolve_url(&base, href)));

        log::info!(
            "Collected {} product links ({} anchors, {} rounds)",
            links.len(),
            hrefs.len(),
            rounds
        );
        Ok(links)
    }

    async fn load_more_round(&self, driver: &dyn PageDriver, round: usize) -> Result<Pagination> {
        let visible = driver.is_visible(&self.load_more).await.unwrap_or(false);
        if !visible {
            log::info!("No more products to load after {} rounds", round - 1);
            return Ok(Pagination::Done);
        }

        let previous = driver.count(&self.product_link).await?;
        if let Err(e) = driver.click(&self.load_more).await {
            log::warn!("Load-more click failed in round {round}: {e}");
            return Ok(Pagination::Done);
        }

        let selector = self.product_link.as_str();
        let grew = wait_until(
            "more product links",
            self.load_more_timeout,
            self.poll_interval,
            move || async move { Ok(driver.count(selector).await? > previous) },
        )
        .await;
        if let Err(e) = grew {
            log::info!("No new products after click in round {round}: {e}");
            return Ok(Pagination::Done);
        }

        if let Err(e) = driver.wait_for_network_idle(self.network_idle_timeout).await {
            log::debug!("Network did not settle in round {round}: {e}");
        }

        let loaded = driver.count(&self.product_link).await?;
        log::info!("Round {round}: {loaded} products loaded");
        Ok(Pagination::More)
    }
}

/// Drop repeated links, keeping the first occurrence of each.
fn dedupe(links: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.clone()))
        .collect()
}
