// src/remote/woocommerce.rs

//! WooCommerce REST v3 catalog client.
//!
//! Every request carries `Authorization: Basic base64(key:secret)`.
//! Non-success responses surface as [`AppError::RemoteRejected`] with the
//! response body preserved, so callers can inspect the store's error code.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::StoreConfig;
use crate::remote::{CatalogStore, RemoteEntry, RemoteProduct, StatusFilter};

const USER_AGENT: &str = concat!("catalog-sync/", env!("CARGO_PKG_VERSION"));

/// Id returned by create and update calls.
#[derive(Debug, Deserialize)]
struct SavedProduct {
    id: u64,
}

/// Client for the `/wp-json/wc/v3/products` collection.
pub struct WooCommerceClient {
    client: Client,
    endpoint: String,
    auth: String,
}

impl WooCommerceClient {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.products_endpoint(),
            auth: basic_auth(&config.consumer_key, &config.consumer_secret),
        })
    }

    fn product_url(&self, id: u64) -> String {
        format!("{}/{}", self.endpoint, id)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.header(AUTHORIZATION, &self.auth).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::RemoteRejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Build a Basic authorization header value.
fn basic_auth(key: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{key}:{secret}")))
}

#[async_trait]
impl CatalogStore for WooCommerceClient {
    async fn find_by_sku(&self, sku: &str, status: StatusFilter) -> Result<Vec<RemoteEntry>> {
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("sku", sku), ("status", status.as_str())]);
        Ok(self.send(request).await?.json().await?)
    }

    async fn create(&self, product: &RemoteProduct) -> Result<u64> {
        let request = self.client.post(&self.endpoint).json(product);
        let saved: SavedProduct = self.send(request).await?.json().await?;
        Ok(saved.id)
    }

    async fn update(&self, id: u64, product: &RemoteProduct) -> Result<u64> {
        let request = self.client.put(self.product_url(id)).json(product);
        let saved: SavedProduct = self.send(request).await?.json().await?;
        Ok(saved.id)
    }

    async fn force_delete(&self, id: u64) -> Result<()> {
        let request = self
            .client
            .delete(self.product_url(id))
            .query(&[("force", "true")]);
        self.send(request).await?;
        Ok(())
    }
}
