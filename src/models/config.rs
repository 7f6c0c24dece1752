//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, ConfigViolation, Result};
use crate::models::{ListingSelectors, ProductSelectors};

/// Environment variables that override the matching config keys.
pub const ENV_SCRAPE_URL: &str = "SCRAPE_URL";
pub const ENV_OUTPUT_PATH: &str = "OUTPUT_PATH";
pub const ENV_STORE_URL: &str = "WC_STORE_URL";
pub const ENV_CONSUMER_KEY: &str = "WC_CONSUMER_KEY";
pub const ENV_CONSUMER_SECRET: &str = "WC_CONSUMER_SECRET";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Page discovery and scraping behavior
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Markup selectors for listing and product pages
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Scrape artifact output
    #[serde(default)]
    pub output: OutputConfig,

    /// Remote WooCommerce store
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    ///
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!(
                "No config file at {}. Using defaults and environment.",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Override values from the process environment.
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Override values using the given variable lookup.
    ///
    /// Empty values are ignored so an unset-but-exported variable does not
    /// wipe a value from the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_SCRAPE_URL) {
            self.scraper.scrape_url = v;
        }
        if let Some(v) = get(ENV_OUTPUT_PATH) {
            self.output.path = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_STORE_URL) {
            self.store.url = v;
        }
        if let Some(v) = get(ENV_CONSUMER_KEY) {
            self.store.consumer_key = v;
        }
        if let Some(v) = get(ENV_CONSUMER_SECRET) {
            self.store.consumer_secret = v;
        }
    }

    /// Validate every setting, reporting all violations at once.
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();

        check_http_url(&mut violations, "scraper.scrape_url", &self.scraper.scrape_url);
        check_http_url(&mut violations, "scraper.site_base_url", &self.scraper.site_base_url);
        check_http_url(&mut violations, "store.url", &self.store.url);

        if self.store.consumer_key.trim().is_empty() {
            violations.push(ConfigViolation::new("store.consumer_key", "is required"));
        }
        if self.store.consumer_secret.trim().is_empty() {
            violations.push(ConfigViolation::new("store.consumer_secret", "is required"));
        }
        if self.output.path.as_os_str().is_empty() {
            violations.push(ConfigViolation::new("output.path", "must not be empty"));
        }
        if self.scraper.user_agent.trim().is_empty() {
            violations.push(ConfigViolation::new("scraper.user_agent", "is empty"));
        }

        let positive = [
            ("scraper.listing_timeout_secs", self.scraper.listing_timeout_secs),
            ("scraper.selector_timeout_secs", self.scraper.selector_timeout_secs),
            ("scraper.load_more_timeout_secs", self.scraper.load_more_timeout_secs),
            (
                "scraper.network_idle_timeout_secs",
                self.scraper.network_idle_timeout_secs,
            ),
            ("scraper.poll_interval_ms", self.scraper.poll_interval_ms),
            ("store.timeout_secs", self.store.timeout_secs),
        ];
        for (field, value) in positive {
            if value == 0 {
                violations.push(ConfigViolation::new(field, "must be > 0"));
            }
        }
        if self.scraper.max_load_more_rounds == 0 {
            violations.push(ConfigViolation::new(
                "scraper.max_load_more_rounds",
                "must be > 0",
            ));
        }

        let listing = &self.selectors.listing;
        let selectors = [
            ("selectors.listing.product_link", listing.product_link.as_str()),
            (
                "selectors.listing.load_more_selector",
                listing.load_more_selector.as_str(),
            ),
        ]
        .into_iter()
        .chain(self.selectors.product.entries());
        for (field, value) in selectors {
            if value.trim().is_empty() {
                violations.push(ConfigViolation::new(field, "must not be empty"));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidConfig(violations))
        }
    }
}

fn check_http_url(violations: &mut Vec<ConfigViolation>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        violations.push(ConfigViolation::new(field, "is required"));
        return;
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => violations.push(ConfigViolation::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => violations.push(ConfigViolation::new(field, format!("invalid URL: {e}"))),
    }
}

/// Page discovery and scraping behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Category listing page to paginate
    #[serde(default)]
    pub scrape_url: String,

    /// Base URL used to resolve relative image sources
    #[serde(default = "defaults::site_base_url")]
    pub site_base_url: String,

    /// User-Agent for the static HTML driver
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Run Chromium without a window
    #[serde(default = "defaults::headless")]
    pub headless: bool,

    /// Page navigation timeout
    #[serde(default = "defaults::listing_timeout")]
    pub listing_timeout_secs: u64,

    /// Timeout for a marker selector to appear
    #[serde(default = "defaults::selector_timeout")]
    pub selector_timeout_secs: u64,

    /// Timeout for new links to appear after a "load more" click
    #[serde(default = "defaults::load_more_timeout")]
    pub load_more_timeout_secs: u64,

    /// Best-effort wait for network quiescence after each load
    #[serde(default = "defaults::network_idle_timeout")]
    pub network_idle_timeout_secs: u64,

    /// Interval between link count polls
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_ms: u64,

    /// Upper bound on "load more" clicks
    #[serde(default = "defaults::max_load_more_rounds")]
    pub max_load_more_rounds: usize,
}

impl ScraperConfig {
    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_secs(self.selector_timeout_secs)
    }

    pub fn load_more_timeout(&self) -> Duration {
        Duration::from_secs(self.load_more_timeout_secs)
    }

    pub fn network_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.network_idle_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            scrape_url: String::new(),
            site_base_url: defaults::site_base_url(),
            user_agent: defaults::user_agent(),
            headless: defaults::headless(),
            listing_timeout_secs: defaults::listing_timeout(),
            selector_timeout_secs: defaults::selector_timeout(),
            load_more_timeout_secs: defaults::load_more_timeout(),
            network_idle_timeout_secs: defaults::network_idle_timeout(),
            poll_interval_ms: defaults::poll_interval(),
            max_load_more_rounds: defaults::max_load_more_rounds(),
        }
    }
}

/// Listing and product page selectors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default)]
    pub listing: ListingSelectors,

    #[serde(default)]
    pub product: ProductSelectors,
}

/// Scrape artifact output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON file receiving the scrape result
    #[serde(default = "defaults::output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: defaults::output_path(),
        }
    }
}

/// Remote WooCommerce store settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store root, e.g. `https://shop.example.com`
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub consumer_key: String,

    #[serde(default)]
    pub consumer_secret: String,

    /// Per-request timeout
    #[serde(default = "defaults::store_timeout")]
    pub timeout_secs: u64,

    /// Stock fields sent with every product
    #[serde(default)]
    pub stock: StockPolicy,
}

impl StoreConfig {
    /// REST v3 products collection endpoint.
    pub fn products_endpoint(&self) -> String {
        format!("{}/wp-json/wc/v3/products", self.url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            consumer_key: String::new(),
            consumer_secret: String::new(),
            timeout_secs: defaults::store_timeout(),
            stock: StockPolicy::default(),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("stock", &self.stock)
            .finish()
    }
}

/// Placeholder stock values; inventory is not reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPolicy {
    #[serde(default = "defaults::manage_stock")]
    pub manage_stock: bool,

    #[serde(default = "defaults::stock_quantity")]
    pub quantity: u32,
}

impl Default for StockPolicy {
    fn default() -> Self {
        Self {
            manage_stock: defaults::manage_stock(),
            quantity: defaults::stock_quantity(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Scraper defaults
    pub fn site_base_url() -> String {
        "https://www.mi-il.co.il".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; catalog-sync/0.1)".into()
    }
    pub fn headless() -> bool {
        true
    }
    pub fn listing_timeout() -> u64 {
        45
    }
    pub fn selector_timeout() -> u64 {
        15
    }
    pub fn load_more_timeout() -> u64 {
        10
    }
    pub fn network_idle_timeout() -> u64 {
        5
    }
    pub fn poll_interval() -> u64 {
        250
    }
    pub fn max_load_more_rounds() -> usize {
        200
    }

    // Output defaults
    pub fn output_path() -> PathBuf {
        PathBuf::from("./data/products.json")
    }

    // Store defaults
    pub fn store_timeout() -> u64 {
        30
    }
    pub fn manage_stock() -> bool {
        true
    }
    pub fn stock_quantity() -> u32 {
        100
    }
}
