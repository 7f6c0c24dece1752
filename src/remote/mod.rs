//! Remote commerce store abstraction.
//!
//! The sync engine only sees [`CatalogStore`]; [`WooCommerceClient`] is the
//! production implementation over the WooCommerce REST v3 API.

mod woocommerce;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use woocommerce::WooCommerceClient;

/// Status restriction for a SKU lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Every non-trashed status
    Any,
    /// Soft-deleted entries only
    Trash,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::Any => "any",
            StatusFilter::Trash => "trash",
        }
    }
}

/// A product as reported by a SKU lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteEntry {
    pub id: u64,
    #[serde(default)]
    pub status: String,
}

impl RemoteEntry {
    pub fn is_trashed(&self) -> bool {
        self.status == StatusFilter::Trash.as_str()
    }
}

/// Image reference sent with a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteImage {
    pub src: String,
}

/// Create/update payload in the store's product schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteProduct {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub status: &'static str,
    pub regular_price: String,
    pub sku: String,
    pub description: String,
    pub manage_stock: bool,
    pub stock_quantity: u32,
    pub images: Vec<RemoteImage>,
}

impl RemoteProduct {
    /// The same payload with its image list cleared.
    pub fn without_images(&self) -> Self {
        Self {
            images: Vec::new(),
            ..self.clone()
        }
    }
}

/// Operations the sync engine needs from the remote catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Entries whose SKU equals `sku`, restricted by `status`.
    async fn find_by_sku(&self, sku: &str, status: StatusFilter) -> Result<Vec<RemoteEntry>>;

    /// Create a product, returning its new id.
    async fn create(&self, product: &RemoteProduct) -> Result<u64>;

    /// Replace product `id`, returning its id.
    async fn update(&self, id: u64, product: &RemoteProduct) -> Result<u64>;

    /// Permanently delete product `id`, bypassing the trash.
    async fn force_delete(&self, id: u64) -> Result<()>;
}
