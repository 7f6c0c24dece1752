// src/browser/chromium.rs

//! Headless Chromium page driver.
//!
//! Element queries run as page scripts so that text-matched controls and
//! visibility checks see the live, script-rendered DOM.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::browser::{ElementQuery, PageDriver};
use crate::error::{AppError, Result};
use crate::models::ScraperConfig;

/// Interval between resource-count samples while waiting for network idle.
const IDLE_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Finds the first element matching a selector and, when given, a text fragment.
const FIND_ELEMENT_JS: &str = r#"
const __find = (sel, text) => Array.from(document.querySelectorAll(sel)).find(
  (el) => text === null || (el.textContent || '').replace(/\s+/g, ' ').includes(text)
);
"#;

/// A single Chromium instance with one page.
pub struct ChromiumDriver {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launch Chromium and open a blank page.
    pub async fn launch(config: &ScraperConfig) -> Result<Self> {
        log::info!("Launching browser (headless: {})", config.headless);

        let mut builder = BrowserConfig::builder().request_timeout(config.listing_timeout());
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(AppError::browser)?;

        let (browser, mut events) = Browser::launch(browser_config)
            .await
            .map_err(AppError::browser)?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    log::debug!("Browser event error: {e}");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(AppError::browser)?;

        log::info!("Browser launched");
        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
        })
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(AppError::browser)?
            .into_value()
            .map_err(AppError::browser)
    }

    async fn resource_count(&self) -> Result<usize> {
        self.eval("performance.getEntriesByType('resource').length".to_string())
            .await
    }
}

/// Encode a Rust string as a JavaScript string literal.
fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn js_opt_str(s: Option<&str>) -> String {
    s.map_or_else(|| "null".to_string(), js_str)
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.page.goto(url))
            .await
            .map_err(|_| AppError::timeout(format!("navigation to {url}"), timeout))?
            .map_err(AppError::browser)?;
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        self.eval(format!(
            "document.querySelectorAll({}).length",
            js_str(selector)
        ))
        .await
    }

    async fn texts(&self, selector: &str) -> Result<Vec<String>> {
        self.eval(format!(
            "Array.from(document.querySelectorAll({})).map((el) => (el.textContent || '').trim())",
            js_str(selector)
        ))
        .await
    }

    async fn attributes(&self, selector: &str, name: &str) -> Result<Vec<String>> {
        self.eval(format!(
            "Array.from(document.querySelectorAll({})).map((el) => el.getAttribute({})).filter((v) => v !== null)",
            js_str(selector),
            js_str(name)
        ))
        .await
    }

    async fn is_visible(&self, query: &ElementQuery) -> Result<bool> {
        self.eval(format!(
            r#"(() => {{
              {FIND_ELEMENT_JS}
              const el = __find({}, {});
              if (!el) return false;
              const style = window.getComputedStyle(el);
              if (style.visibility === 'hidden' || style.display === 'none') return false;
              return !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
            }})()"#,
            js_str(&query.selector),
            js_opt_str(query.text.as_deref())
        ))
        .await
    }

    async fn click(&self, query: &ElementQuery) -> Result<()> {
        let clicked: bool = self
            .eval(format!(
                r#"(() => {{
                  {FIND_ELEMENT_JS}
                  const el = __find({}, {});
                  if (!el) return false;
                  el.scrollIntoView({{ block: 'center' }});
                  el.click();
                  return true;
                }})()"#,
                js_str(&query.selector),
                js_opt_str(query.text.as_deref())
            ))
            .await?;

        if clicked {
            Ok(())
        } else {
            Err(AppError::browser(format!(
                "no element '{}' to click",
                query.selector
            )))
        }
    }

    /// Waits until the number of loaded resources stops changing between samples.
    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()> {
        let settle = async {
            let mut last = self.resource_count().await?;
            loop {
                tokio::time::sleep(IDLE_SAMPLE_INTERVAL).await;
                let current = self.resource_count().await?;
                if current == last {
                    return Ok::<(), AppError>(());
                }
                last = current;
            }
        };

        tokio::time::timeout(timeout, settle)
            .await
            .map_err(|_| AppError::timeout("network idle", timeout))?
    }

    async fn close(&self) -> Result<()> {
        log::info!("Closing browser");
        let mut browser = self.browser.lock().await;
        browser.close().await.map_err(AppError::browser)?;
        browser.wait().await?;
        self.handler.abort();
        Ok(())
    }
}
