//! CSS selectors describing the listing and product page markup.

use serde::{Deserialize, Serialize};

/// Markup contract of the category listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// Repeated anchor pointing at a product page
    #[serde(default = "defaults::product_link")]
    pub product_link: String,

    /// Element type of the "load more" control
    #[serde(default = "defaults::load_more_selector")]
    pub load_more_selector: String,

    /// Visible text identifying the "load more" control
    #[serde(default = "defaults::load_more_text")]
    pub load_more_text: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            product_link: defaults::product_link(),
            load_more_selector: defaults::load_more_selector(),
            load_more_text: defaults::load_more_text(),
        }
    }
}

/// Markup contract of a single product page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSelectors {
    /// Title marker; its absence means the page did not render
    #[serde(default = "defaults::name")]
    pub name: String,

    #[serde(default = "defaults::price")]
    pub price: String,

    /// Description paragraphs, joined by newline
    #[serde(default = "defaults::description")]
    pub description: String,

    /// Image element whose `src` is read
    #[serde(default = "defaults::image")]
    pub image: String,

    #[serde(default = "defaults::catalog_number")]
    pub catalog_number: String,
}

impl Default for ProductSelectors {
    fn default() -> Self {
        Self {
            name: defaults::name(),
            price: defaults::price(),
            description: defaults::description(),
            image: defaults::image(),
            catalog_number: defaults::catalog_number(),
        }
    }
}

impl ProductSelectors {
    /// All selectors paired with their config key, for validation.
    pub fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("selectors.product.name", &self.name),
            ("selectors.product.price", &self.price),
            ("selectors.product.description", &self.description),
            ("selectors.product.image", &self.image),
            ("selectors.product.catalog_number", &self.catalog_number),
        ]
    }
}

mod defaults {
    pub fn product_link() -> String {
        "a.product.tpurl".into()
    }
    pub fn load_more_selector() -> String {
        "button".into()
    }
    pub fn load_more_text() -> String {
        "טעינת מוצרים נוספים".into()
    }

    pub fn name() -> String {
        "h1.product-title-h2".into()
    }
    pub fn price() -> String {
        ".single-price .price".into()
    }
    pub fn description() -> String {
        ".desc-abv p".into()
    }
    pub fn image() -> String {
        ".single-gallery li.lslide img".into()
    }
    pub fn catalog_number() -> String {
        "#product-barcode".into()
    }
}
