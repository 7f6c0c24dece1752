//! Page driver abstraction over the browser used for scraping.
//!
//! Discovery and scraping only talk to [`PageDriver`]; the concrete driver
//! is chosen at startup:
//! - [`ChromiumDriver`]: headless Chromium, runs page scripts (feature `browser`)
//! - [`HttpDriver`]: fetches server-rendered HTML, cannot click

#[cfg(feature = "browser")]
mod chromium;
pub mod document;
mod http;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};

#[cfg(feature = "browser")]
pub use chromium::ChromiumDriver;
pub use http::HttpDriver;

/// Interval used when polling the page for a selector to appear.
pub const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// An element identified by selector and, optionally, its visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementQuery {
    pub selector: String,
    pub text: Option<String>,
}

impl ElementQuery {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            text: None,
        }
    }

    pub fn with_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            text: Some(text.into()),
        }
    }
}

/// Operations the scraper needs from a browser page.
///
/// Every method is fallible; waits are bounded by the given timeout.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load `url` in the page.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Number of elements currently matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize>;

    /// Trimmed text content of every element matching `selector`.
    async fn texts(&self, selector: &str) -> Result<Vec<String>>;

    /// Value of attribute `name` on every matching element that has it.
    async fn attributes(&self, selector: &str, name: &str) -> Result<Vec<String>>;

    /// Whether a matching element exists and is rendered.
    async fn is_visible(&self, query: &ElementQuery) -> Result<bool>;

    /// Click the first matching element.
    async fn click(&self, query: &ElementQuery) -> Result<()>;

    /// Wait until at least one element matches `selector`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        wait_until(
            &format!("selector '{selector}'"),
            timeout,
            SELECTOR_POLL_INTERVAL,
            move || async move { Ok(self.count(selector).await? > 0) },
        )
        .await
    }

    /// Best-effort wait for the page to stop loading resources.
    async fn wait_for_network_idle(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    /// Release the underlying browser.
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn first_text(&self, selector: &str) -> Result<Option<String>> {
        Ok(self.texts(selector).await?.into_iter().next())
    }

    async fn first_attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        Ok(self.attributes(selector, name).await?.into_iter().next())
    }
}

/// Poll `check` every `interval` until it returns `true`, bounded by `timeout`.
///
/// An error from `check` ends the wait immediately.
pub async fn wait_until<F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let poll = async {
        loop {
            if check().await? {
                return Ok::<(), AppError>(());
            }
            tokio::time::sleep(interval).await;
        }
    };

    match tokio::time::timeout(timeout, poll).await {
        Ok(result) => result,
        Err(_) => Err(AppError::timeout(what, timeout)),
    }
}
