//! In-memory doubles for the page driver and the remote store.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::browser::{ElementQuery, PageDriver, document};
use crate::error::{AppError, Result};
use crate::models::{ListingSelectors, Product, ProductCandidate};
use crate::remote::{CatalogStore, RemoteEntry, RemoteProduct, StatusFilter};

/// Build a valid product with the given catalog number.
pub fn product(sku: &str) -> Product {
    ProductCandidate {
        catalog_number: sku.to_string(),
        name: format!("Product {sku}"),
        description: "Sturdy".into(),
        price: "₪1,234.50".into(),
        image_url: format!("https://shop.example/images/{sku}.jpg"),
        product_url: format!("https://shop.example/p/{sku}"),
        scraped_at: Utc::now(),
    }
    .validate()
    .unwrap()
}

/// Markup served for one URL, with chunks revealed by "load more" clicks.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    body: String,
    more: Vec<String>,
    stuck_button: bool,
}

impl ScriptedPage {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// Markup appended on the next "load more" click.
    pub fn with_more(mut self, chunk: impl Into<String>) -> Self {
        self.more.push(chunk.into());
        self
    }

    /// Keep the "load more" control visible after all chunks are revealed.
    pub fn stuck(mut self) -> Self {
        self.stuck_button = true;
        self
    }
}

#[derive(Default)]
struct DriverState {
    body: Option<String>,
    pending: VecDeque<String>,
    stuck: bool,
    clicks: usize,
    visits: Vec<String>,
    closed: bool,
}

impl DriverState {
    fn render(&self, load_more_text: &str) -> Option<String> {
        let body = self.body.as_ref()?;
        let button = if !self.pending.is_empty() || self.stuck {
            format!("<button>{load_more_text}</button>")
        } else {
            String::new()
        };
        Some(format!("<html><body>{body}{button}</body></html>"))
    }
}

/// Page driver serving scripted markup through the static HTML queries.
pub struct ScriptedDriver {
    pages: HashMap<String, ScriptedPage>,
    load_more_text: String,
    state: Mutex<DriverState>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            load_more_text: ListingSelectors::default().load_more_text,
            state: Mutex::new(DriverState::default()),
        }
    }

    pub fn page(mut self, url: &str, page: ScriptedPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn clicks(&self) -> usize {
        self.state.lock().unwrap().clicks
    }

    pub fn visits(&self) -> Vec<String> {
        self.state.lock().unwrap().visits.clone()
    }

    pub fn closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    fn with_page<T>(&self, f: impl FnOnce(&str) -> Result<T>) -> Result<T> {
        let state = self.state.lock().unwrap();
        match state.render(&self.load_more_text) {
            Some(html) => f(&html),
            None => Err(AppError::browser("no page loaded")),
        }
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.visits.push(url.to_string());
        let Some(page) = self.pages.get(url) else {
            state.body = None;
            return Err(AppError::timeout(format!("navigation to {url}"), timeout));
        };
        state.body = Some(page.body.clone());
        state.pending = page.more.iter().cloned().collect();
        state.stuck = page.stuck_button;
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
        if !self.is_visible(query).await? {
            return Err(AppError::browser("nothing to click"));
        }
        let mut state = self.state.lock().unwrap();
        state.clicks += 1;
        if let Some(chunk) = state.pending.pop_front() {
            if let Some(body) = state.body.as_mut() {
                body.push_str(&chunk);
            }
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

/// A call received by [`FakeStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Find(String, StatusFilter),
    Create { sku: String, images: usize },
    Update { id: u64, sku: String, images: usize },
    Delete(u64),
}

#[derive(Debug, Clone)]
struct StoredProduct {
    sku: String,
    trashed: bool,
}

#[derive(Default)]
struct StoreState {
    next_id: u64,
    products: BTreeMap<u64, StoredProduct>,
    calls: Vec<StoreCall>,
    image_failures: usize,
    rejected_skus: HashSet<String>,
    broken_lookups: bool,
}

impl StoreState {
    fn insert(&mut self, sku: &str, trashed: bool) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.products.insert(
            id,
            StoredProduct {
                sku: sku.to_string(),
                trashed,
            },
        );
        id
    }

    fn check_submission(&mut self, product: &RemoteProduct) -> Result<()> {
        if self.rejected_skus.contains(&product.sku) {
            return Err(AppError::RemoteRejected {
                status: 400,
                body: r#"{"code":"product_invalid_sku","message":"Invalid or duplicated SKU."}"#
                    .into(),
            });
        }
        if self.image_failures > 0 && !product.images.is_empty() {
            self.image_failures -= 1;
            return Err(AppError::RemoteRejected {
                status: 400,
                body: r#"{"code":"woocommerce_product_image_upload_error","message":"Error getting remote image."}"#
                    .into(),
            });
        }
        Ok(())
    }
}

/// In-memory catalog that records every call.
pub struct FakeStore {
    state: Mutex<StoreState>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn with_active(self, sku: &str) -> Self {
        self.state.lock().unwrap().insert(sku, false);
        self
    }

    pub fn with_trashed(self, sku: &str) -> Self {
        self.state.lock().unwrap().insert(sku, true);
        self
    }

    /// Reject the next `n` submissions that carry images.
    pub fn failing_images(self, n: usize) -> Self {
        self.state.lock().unwrap().image_failures = n;
        self
    }

    pub fn rejecting(self, sku: &str) -> Self {
        self.state.lock().unwrap().rejected_skus.insert(sku.to_string());
        self
    }

    pub fn with_broken_lookups(self) -> Self {
        self.state.lock().unwrap().broken_lookups = true;
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of live (non-trashed) entries with `sku`.
    pub fn live_count(&self, sku: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .products
            .values()
            .filter(|p| p.sku == sku && !p.trashed)
            .count()
    }
}

#[async_trait]
impl CatalogStore for FakeStore {
    async fn find_by_sku(&self, sku: &str, status: StatusFilter) -> Result<Vec<RemoteEntry>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Find(sku.to_string(), status));
        if state.broken_lookups {
            return Err(AppError::RemoteRejected {
                status: 500,
                body: "internal error".into(),
            });
        }
        let want_trash = status == StatusFilter::Trash;
        Ok(state
            .products
            .iter()
            .filter(|(_, p)| p.sku == sku && p.trashed == want_trash)
            .map(|(id, p)| RemoteEntry {
                id: *id,
                status: if p.trashed { "trash" } else { "publish" }.to_string(),
            })
            .collect())
    }

    async fn create(&self, product: &RemoteProduct) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Create {
            sku: product.sku.clone(),
            images: product.images.len(),
        });
        state.check_submission(product)?;
        Ok(state.insert(&product.sku, false))
    }

    async fn update(&self, id: u64, product: &RemoteProduct) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Update {
            id,
            sku: product.sku.clone(),
            images: product.images.len(),
        });
        state.check_submission(product)?;
        match state.products.get_mut(&id) {
            Some(stored) => {
                stored.sku = product.sku.clone();
                Ok(id)
            }
            None => Err(AppError::RemoteRejected {
                status: 404,
                body: "no such product".into(),
            }),
        }
    }

    async fn force_delete(&self, id: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Delete(id));
        match state.products.remove(&id) {
            Some(_) => Ok(()),
            None => Err(AppError::RemoteRejected {
                status: 404,
                body: "no such product".into(),
            }),
        }
    }
}
