//! Service layer for catalog sync.
//!
//! This module contains the business logic for:
//! - Listing pagination and link discovery (`LinkCollector`)
//! - Product page extraction (`ProductScraper`)
//! - Remote catalog reconciliation (`SyncEngine`)

mod links;
mod products;
mod sync;

pub use links::LinkCollector;
pub use products::{ProductScraper, ScrapeOutcome, ScrapeReport, SkipReason};
pub use sync::{BATCH_SIZE, MAX_IMAGE_RETRIES, SyncEngine, sanitize_price, transform};
