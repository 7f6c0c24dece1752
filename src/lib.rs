// src/lib.rs

//! Catalog scraper and WooCommerce sync library.

pub mod browser;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod remote;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod test_support;
