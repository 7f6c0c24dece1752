// src/services/sync.rs

//! Catalog reconciliation engine.
//!
//! Each product goes through locate → decide → act against the remote
//! store:
//!
//! | Remote state       | Action                                  |
//! |--------------------|-----------------------------------------|
//! | not found          | create                                  |
//! | active (`id`)      | update `id`                             |
//! | trashed (`id`)     | force-delete `id`, then create          |
//!
//! Trashed entries are re-created rather than updated because an update
//! does not reliably bring them back to `publish`.
//!
//! Products are processed in batches of [`BATCH_SIZE`], strictly one at a
//! time. A failure is recorded and the run moves on to the next product.

use std::borrow::Cow;

use crate::error::Result;
use crate::models::{
    Lookup, Product, StockPolicy, SyncAction, SyncOutcome, SyncSummary, SyncTally,
};
use crate::remote::{CatalogStore, RemoteImage, RemoteProduct, StatusFilter};

/// Products per reporting batch.
pub const BATCH_SIZE: usize = 10;

/// Resubmissions allowed after an image upload failure.
pub const MAX_IMAGE_RETRIES: usize = 1;

/// Keep ASCII digits and the first decimal point, in order.
///
/// `"₪1,234.50"` becomes `"1234.50"`.
pub fn sanitize_price(display: &str) -> String {
    let mut seen_point = false;
    display
        .chars()
        .filter(|c| match c {
            '0'..='9' => true,
            '.' if !seen_point => {
                seen_point = true;
                true
            }
            _ => false,
        })
        .collect()
}

/// Map a scraped product onto the store's product schema.
pub fn transform(product: &Product, stock: &StockPolicy) -> RemoteProduct {
    let images = if product.image_url().is_empty() {
        Vec::new()
    } else {
        vec![RemoteImage {
            src: product.image_url().to_string(),
        }]
    };

    RemoteProduct {
        name: product.name().to_string(),
        kind: "simple",
        status: "publish",
        regular_price: sanitize_price(product.price()),
        sku: product.catalog_number().to_string(),
        description: product.description().to_string(),
        manage_stock: stock.manage_stock,
        stock_quantity: stock.quantity,
        images,
    }
}

/// Reconciles scraped products with a remote catalog.
pub struct SyncEngine<S> {
    store: S,
    stock: StockPolicy,
}

impl<S: CatalogStore> SyncEngine<S> {
    pub fn new(store: S, stock: StockPolicy) -> Self {
        Self { store, stock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Sync all products batch by batch, logging each batch and the running total.
    pub async fn sync_all(&self, products: &[Product]) -> SyncSummary {
        let batch_count = products.len().div_ceil(BATCH_SIZE);
        log::info!(
            "Starting WooCommerce sync: {} products in {} batches of {}",
            products.len(),
            batch_count,
            BATCH_SIZE
        );

        let mut summary = SyncSummary::default();
        for (index, batch) in products.chunks(BATCH_SIZE).enumerate() {
            log::info!("Syncing batch {}/{} ({} products)", index + 1, batch_count, batch.len());

            let tally = self.sync_batch(batch).await;
            summary.total.merge(&tally);

            log::info!(
                "Batch {} synced: {} created, {} updated, {} failed (total {}/{}/{})",
                index + 1,
                tally.created,
                tally.updated,
                tally.failed,
                summary.total.created,
                summary.total.updated,
                summary.total.failed
            );
            summary.batches.push(tally);
        }

        log::info!(
            "WooCommerce sync complete: {} created, {} updated, {} failed",
            summary.total.created,
            summary.total.updated,
            summary.total.failed
        );
        summary
    }

    /// Sync one batch, sequentially.
    pub async fn sync_batch(&self, products: &[Product]) -> SyncTally {
        let mut tally = SyncTally::default();
        for product in products {
            let outcome = self.sync_product(product).await;
            tally.record(product.catalog_number(), outcome);
        }
        tally
    }

    /// Reconcile a single product. Never fails; errors become [`SyncOutcome::Failed`].
    pub async fn sync_product(&self, product: &Product) -> SyncOutcome {
        let payload = transform(product, &self.stock);
        let sku = payload.sku.as_str();

        let action = match self.plan(product).await {
            Ok(action) => action,
            Err(e) => {
                log::error!("Lookup failed for SKU {sku}: {e}");
                return SyncOutcome::Failed(format!("lookup failed: {e}"));
            }
        };

        if let SyncAction::RecreateFromTrash(id) = action {
            log::info!("SKU {sku} is trashed as #{id}; deleting before re-creating");
            if let Err(e) = self.store.force_delete(id).await {
                log::warn!("Could not delete trashed product #{id} for SKU {sku}: {e}");
                return SyncOutcome::Failed(format!("could not delete trashed product {id}: {e}"));
            }
        }

        match self.submit(action, &payload).await {
            Ok(id) => {
                let outcome = match action {
                    SyncAction::Update(_) => SyncOutcome::Updated,
                    SyncAction::Create | SyncAction::RecreateFromTrash(_) => SyncOutcome::Created,
                };
                log::info!("Product {sku} ({}) {outcome:?} as #{id}", payload.name);
                outcome
            }
            Err(e) => {
                log::warn!("WooCommerce API error for SKU {sku}: {e}");
                SyncOutcome::Failed(e.to_string())
            }
        }
    }

    /// Decide what to do for a product without changing the remote catalog.
    pub async fn plan(&self, product: &Product) -> Result<SyncAction> {
        Ok(self.locate(product.catalog_number()).await?.into())
    }

    /// Find the remote entry for `sku`, looking in the trash only when nothing live matches.
    pub async fn locate(&self, sku: &str) -> Result<Lookup> {
        let live = self.store.find_by_sku(sku, StatusFilter::Any).await?;
        let entries = if live.is_empty() {
            self.store.find_by_sku(sku, StatusFilter::Trash).await?
        } else {
            live
        };

        let Some(first) = entries.first() else {
            return Ok(Lookup::NotFound);
        };
        if entries.len() > 1 {
            log::warn!(
                "{} remote products share SKU {sku}; using #{}",
                entries.len(),
                first.id
            );
        }

        Ok(if first.is_trashed() {
            Lookup::Trashed(first.id)
        } else {
            Lookup::Active(first.id)
        })
    }

    /// Create or update, retrying once without images when the store rejects an image.
    async fn submit(&self, action: SyncAction, payload: &RemoteProduct) -> Result<u64> {
        let mut body = Cow::Borrowed(payload);
        let mut retries_left = MAX_IMAGE_RETRIES;

        loop {
            let result = match action {
                SyncAction::Update(id) => self.store.update(id, &body).await,
                SyncAction::Create | SyncAction::RecreateFromTrash(_) => {
                    self.store.create(&body).await
                }
            };

            match result {
                Err(e) if e.is_image_upload_error() && !body.images.is_empty() && retries_left > 0 => {
                    log::warn!(
                        "Image upload failed for SKU {}, retrying without images",
                        payload.sku
                    );
                    retries_left -= 1;
                    body = Cow::Owned(payload.without_images());
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeStore, StoreCall, product};

    fn engine(store: FakeStore) -> SyncEngine<FakeStore> {
        SyncEngine::new(store, StockPolicy::default())
    }

    fn count(calls: &[StoreCall], pred: impl Fn(&StoreCall) -> bool) -> usize {
        calls.iter().filter(|c| pred(c)).count()
    }

    #[test]
    fn sanitize_price_strips_everything_but_digits_and_point() {
        assert_eq!(sanitize_price("₪1,234.50"), "1234.50");
        assert_eq!(sanitize_price("$12.50 each"), "12.50");
        assert_eq!(sanitize_price("₪ 120"), "120");
        assert_eq!(sanitize_price("1.234.50"), "1.23450");
        assert_eq!(sanitize_price("call us"), "");
    }

    #[test]
    fn transform_maps_fields() {
        let stock = StockPolicy {
            manage_stock: true,
            quantity: 7,
        };
        let payload = transform(&product("A1"), &stock);
        assert_eq!(payload.sku, "A1");
        assert_eq!(payload.name, "Product A1");
        assert_eq!(payload.regular_price, "1234.50");
        assert_eq!(payload.kind, "simple");
        assert_eq!(payload.status, "publish");
        assert_eq!(payload.stock_quantity, 7);
        assert_eq!(payload.images.len(), 1);
        assert_eq!(payload.images[0].src, "https://shop.example/images/A1.jpg");
    }

    #[tokio::test]
    async fn new_sku_is_created_after_both_lookups() {
        let engine = engine(FakeStore::new());

        assert_eq!(engine.sync_product(&product("A")).await, SyncOutcome::Created);
        assert_eq!(
            engine.store().calls(),
            vec![
                StoreCall::Find("A".into(), StatusFilter::Any),
                StoreCall::Find("A".into(), StatusFilter::Trash),
                StoreCall::Create {
                    sku: "A".into(),
                    images: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn syncing_twice_creates_then_updates() {
        let engine = engine(FakeStore::new());
        let p = product("A");

        assert_eq!(engine.sync_product(&p).await, SyncOutcome::Created);
        assert_eq!(engine.sync_product(&p).await, SyncOutcome::Updated);
        assert_eq!(engine.store().live_count("A"), 1);
    }

    #[tokio::test]
    async fn trashed_entry_is_deleted_then_recreated() {
        let engine = engine(FakeStore::new().with_trashed("A"));

        assert_eq!(engine.sync_product(&product("A")).await, SyncOutcome::Created);

        let calls = engine.store().calls();
        assert_eq!(count(&calls, |c| matches!(c, StoreCall::Delete(1))), 1);
        assert_eq!(count(&calls, |c| matches!(c, StoreCall::Create { .. })), 1);
        assert_eq!(count(&calls, |c| matches!(c, StoreCall::Update { .. })), 0);
        let delete_at = calls.iter().position(|c| matches!(c, StoreCall::Delete(_)));
        let create_at = calls.iter().position(|c| matches!(c, StoreCall::Create { .. }));
        assert!(delete_at < create_at);
        assert_eq!(engine.store().live_count("A"), 1);
    }

    #[tokio::test]
    async fn image_failure_retries_once_without_images() {
        let engine = engine(FakeStore::new().failing_images(1));

        assert_eq!(engine.sync_product(&product("A")).await, SyncOutcome::Created);

        let creates: Vec<_> = engine
            .store()
            .calls()
            .into_iter()
            .filter(|c| matches!(c, StoreCall::Create { .. }))
            .collect();
        assert_eq!(
            creates,
            vec![
                StoreCall::Create {
                    sku: "A".into(),
                    images: 1
                },
                StoreCall::Create {
                    sku: "A".into(),
                    images: 0
                },
            ]
        );
    }

    #[tokio::test]
    async fn image_failure_on_update_keeps_update_action() {
        let engine = engine(FakeStore::new().with_active("A").failing_images(1));

        assert_eq!(engine.sync_product(&product("A")).await, SyncOutcome::Updated);

        let calls = engine.store().calls();
        assert_eq!(count(&calls, |c| matches!(c, StoreCall::Update { .. })), 2);
        assert_eq!(count(&calls, |c| matches!(c, StoreCall::Create { .. })), 0);
    }

    #[tokio::test]
    async fn other_rejections_are_not_retried() {
        let engine = engine(FakeStore::new().rejecting("A"));

        let outcome = engine.sync_product(&product("A")).await;

        assert!(matches!(outcome, SyncOutcome::Failed(ref m) if m.contains("product_invalid_sku")));
        let calls = engine.store().calls();
        assert_eq!(count(&calls, |c| matches!(c, StoreCall::Create { .. })), 1);
    }

    #[tokio::test]
    async fn image_retry_is_bounded_to_one_attempt() {
        struct AlwaysImageError;

        #[async_trait::async_trait]
        impl CatalogStore for AlwaysImageError {
            async fn find_by_sku(
                &self,
                _sku: &str,
                _status: StatusFilter,
            ) -> Result<Vec<crate::remote::RemoteEntry>> {
                Ok(Vec::new())
            }
            async fn create(&self, _product: &RemoteProduct) -> Result<u64> {
                Err(crate::error::AppError::RemoteRejected {
                    status: 400,
                    body: "woocommerce_product_image_upload_error".into(),
                })
            }
            async fn update(&self, _id: u64, _product: &RemoteProduct) -> Result<u64> {
                unreachable!("no update expected")
            }
            async fn force_delete(&self, _id: u64) -> Result<()> {
                unreachable!("no delete expected")
            }
        }

        let engine = SyncEngine::new(AlwaysImageError, StockPolicy::default());
        let outcome = engine.sync_product(&product("A")).await;
        assert!(matches!(outcome, SyncOutcome::Failed(ref m) if m.contains("image_upload_error")));
    }

    #[tokio::test]
    async fn lookup_error_fails_without_writing() {
        let engine = engine(FakeStore::new().with_broken_lookups());

        let outcome = engine.sync_product(&product("A")).await;

        assert!(matches!(outcome, SyncOutcome::Failed(ref m) if m.starts_with("lookup failed")));
        assert_eq!(engine.store().calls().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_skus_use_first_match() {
        let engine = engine(FakeStore::new().with_active("A").with_active("A"));
        assert_eq!(engine.locate("A").await.unwrap(), Lookup::Active(1));
    }

    #[tokio::test]
    async fn plan_does_not_modify_the_store() {
        let engine = engine(FakeStore::new().with_trashed("T").with_active("U"));

        assert_eq!(
            engine.plan(&product("T")).await.unwrap(),
            SyncAction::RecreateFromTrash(1)
        );
        assert_eq!(engine.plan(&product("U")).await.unwrap(), SyncAction::Update(2));
        assert_eq!(engine.plan(&product("N")).await.unwrap(), SyncAction::Create);
        assert!(
            engine
                .store()
                .calls()
                .iter()
                .all(|c| matches!(c, StoreCall::Find(..)))
        );
    }

    #[tokio::test]
    async fn failures_are_isolated_and_tallied_per_batch() {
        let products: Vec<_> = (0..23).map(|i| product(&format!("P{i}"))).collect();
        let engine = engine(FakeStore::new().with_active("P3").rejecting("P12"));

        let summary = engine.sync_all(&products).await;

        let sizes: Vec<_> = summary.batches.iter().map(SyncTally::total).collect();
        assert_eq!(sizes, vec![10, 10, 3]);
        assert_eq!(summary.total.created, 21);
        assert_eq!(summary.total.updated, 1);
        assert_eq!(summary.total.failed, 1);
        assert_eq!(summary.total.failures[0].sku, "P12");
        assert_eq!(summary.batches[1].failed, 1);
        assert_eq!(summary.total.total(), 23);
    }
}
