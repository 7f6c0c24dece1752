//! Scraped product records and their validation gate.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Raw field values pulled from a product page, before validation.
///
/// Any field may be empty when its marker was missing or unreadable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCandidate {
    #[serde(default)]
    pub catalog_number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub product_url: String,
    pub scraped_at: DateTime<Utc>,
}

/// A field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All violations found for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations(pub Vec<FieldViolation>);

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&joined)
    }
}

impl ProductCandidate {
    /// Validate the candidate as a unit.
    ///
    /// Returns every violated field rather than stopping at the first.
    pub fn validate(self) -> Result<Product, Violations> {
        let mut violations = Vec::new();

        let catalog_number = self.catalog_number.trim().to_string();
        let name = self.name.trim().to_string();
        let price = self.price.trim().to_string();
        let image_url = self.image_url.trim().to_string();
        let product_url = self.product_url.trim().to_string();

        if catalog_number.is_empty() {
            violations.push(FieldViolation::new("catalogNumber", "must not be empty"));
        }
        if name.is_empty() {
            violations.push(FieldViolation::new("name", "must not be empty"));
        }
        if price.is_empty() {
            violations.push(FieldViolation::new("price", "must not be empty"));
        }
        if !image_url.is_empty() {
            if let Err(message) = check_absolute_url(&image_url) {
                violations.push(FieldViolation::new("imageUrl", message));
            }
        }
        if product_url.is_empty() {
            violations.push(FieldViolation::new("productUrl", "must not be empty"));
        } else if let Err(message) = check_absolute_url(&product_url) {
            violations.push(FieldViolation::new("productUrl", message));
        }

        if !violations.is_empty() {
            return Err(Violations(violations));
        }

        Ok(Product {
            catalog_number,
            name,
            description: self.description,
            price,
            image_url,
            product_url,
            scraped_at: self.scraped_at,
        })
    }
}

fn check_absolute_url(value: &str) -> Result<(), String> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(format!("unsupported scheme '{}'", url.scheme())),
        Err(e) => Err(format!("invalid URL: {e}")),
    }
}

/// A validated product record.
///
/// Only obtainable through [`ProductCandidate::validate`]; deserializing a
/// stored record runs the same validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ProductCandidate")]
pub struct Product {
    catalog_number: String,
    name: String,
    description: String,
    price: String,
    image_url: String,
    product_url: String,
    scraped_at: DateTime<Utc>,
}

impl TryFrom<ProductCandidate> for Product {
    type Error = Violations;

    fn try_from(candidate: ProductCandidate) -> Result<Self, Self::Error> {
        candidate.validate()
    }
}

impl Product {
    /// Catalog number, used as the remote SKU.
    pub fn catalog_number(&self) -> &str {
        &self.catalog_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Raw display price, e.g. `₪120.00`.
    pub fn price(&self) -> &str {
        &self.price
    }

    /// Absolute image URL, or empty when the page had none.
    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn product_url(&self) -> &str {
        &self.product_url
    }

    pub fn scraped_at(&self) -> DateTime<Utc> {
        self.scraped_at
    }
}

/// Persisted scrape artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub scraped_at: DateTime<Utc>,
    pub total_found: usize,
    pub total_scraped: usize,
    pub products: Vec<Product>,
}

impl ScrapeResult {
    pub fn new(total_found: usize, products: Vec<Product>) -> Self {
        Self {
            scraped_at: Utc::now(),
            total_found,
            total_scraped: products.len(),
            products,
        }
    }
}
