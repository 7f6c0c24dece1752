// src/models/mod.rs

//! Domain models for the catalog sync application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod product;
mod selectors;
mod sync;

// Re-export all public types
pub use config::{
    Config, OutputConfig, ScraperConfig, SelectorConfig, StockPolicy, StoreConfig,
    ENV_CONSUMER_KEY, ENV_CONSUMER_SECRET, ENV_OUTPUT_PATH, ENV_SCRAPE_URL, ENV_STORE_URL,
};
pub use product::{FieldViolation, Product, ProductCandidate, ScrapeResult, Violations};
pub use selectors::{ListingSelectors, ProductSelectors};
pub use sync::{Lookup, SyncAction, SyncFailure, SyncOutcome, SyncSummary, SyncTally};
