// src/browser/http.rs

//! Static HTML page driver.
//!
//! Fetches pages with reqwest and answers queries against the returned
//! markup. Nothing is executed, so "load more" controls cannot be clicked
//! and discovery stops at the first page.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::browser::{ElementQuery, PageDriver, document};
use crate::error::{AppError, Result};
use crate::models::ScraperConfig;
use crate::utils::http;

/// Page driver backed by plain HTTP requests.
pub struct HttpDriver {
    client: Client,
    current: Mutex<Option<String>>,
}

impl HttpDriver {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = http::create_client(&config.user_agent, config.listing_timeout())?;
        Ok(Self {
            client,
            current: Mutex::new(None),
        })
    }

    fn with_page<T>(&self, f: impl FnOnce(&str) -> Result<T>) -> Result<T> {
        let guard = self
            .current
            .lock()
            .map_err(|_| AppError::browser("page state poisoned"))?;
        match guard.as_deref() {
            Some(html) => f(html),
            None => Err(AppError::browser("no page loaded")),
        }
    }
}

#[async_trait]
impl PageDriver for HttpDriver {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let html = tokio::time::timeout(timeout, http::fetch_text(&self.client, url))
            .await
            .map_err(|_| AppError::timeout(format!("navigation to {url}"), timeout))??;

        let mut guard = self
            .current
            .lock()
            .map_err(|_| AppError::browser("page state poisoned"))?;
        *guard = Some(html);
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        self.with_page(|html| document::count(html, selector))
    }

    async fn texts(&self, selector: &str) -> Result<Vec<String>> {
        self.with_page(|html| document::texts(html, selector))
    }

    async fn attributes(&self, selector: &str, name: &str) -> Result<Vec<String>> {
        self.with_page(|html| document::attributes(html, selector, name))
    }

    async fn is_visible(&self, query: &ElementQuery) -> Result<bool> {
        self.with_page(|html| document::matches(html, query))
    }

    async fn click(&self, query: &ElementQuery) -> Result<()> {
        Err(AppError::unsupported(format!(
            "cannot click '{}' without a scripting browser",
            query.selector
        )))
    }

    /// Static markup never changes after load, so there is nothing to wait for.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        if self.count(selector).await? > 0 {
            Ok(())
        } else {
            Err(AppError::timeout(format!("selector '{selector}'"), timeout))
        }
    }
}
