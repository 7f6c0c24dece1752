//! Persistence for scrape artifacts.
//!
//! A scrape is stored as a single pretty-printed JSON document:
//!
//! ```text
//! {
//!   "scrapedAt": "2026-10-19T08:00:00Z",
//!   "totalFound": 120,
//!   "totalScraped": 118,
//!   "products": [ { "catalogNumber": "...", ... } ]
//! }
//! ```
//!
//! Products are re-validated when the document is read back.

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::ScrapeResult;

// Re-export for convenience
pub use local::ResultWriter;

/// Metadata about a completed write.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Final location of the artifact
    pub path: PathBuf,
    /// Number of products written
    pub product_count: usize,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Trait for scrape artifact backends.
#[async_trait]
pub trait ResultStorage: Send + Sync {
    /// Persist a scrape, replacing any previous artifact.
    async fn write_result(&self, result: &ScrapeResult) -> Result<WriteMetadata>;

    /// Load the last persisted scrape.
    async fn load_result(&self) -> Result<ScrapeResult>;
}
