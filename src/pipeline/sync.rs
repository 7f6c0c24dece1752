// src/pipeline/sync.rs

//! Sync stage over a stored scrape artifact.

use serde::Serialize;

use crate::error::Result;
use crate::models::{Product, SyncAction, SyncFailure, SyncSummary};
use crate::remote::CatalogStore;
use crate::services::SyncEngine;
use crate::storage::ResultStorage;

/// What a sync would do, computed without touching the remote catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    pub create: usize,
    pub update: usize,
    pub recreate: usize,
    /// Products whose lookup failed
    pub failures: Vec<SyncFailure>,
}

impl SyncPlan {
    fn record(&mut self, action: SyncAction) {
        match action {
            SyncAction::Create => self.create += 1,
            SyncAction::Update(_) => self.update += 1,
            SyncAction::RecreateFromTrash(_) => self.recreate += 1,
        }
    }
}

/// Sync every product of the stored artifact.
pub async fn run_sync<S: CatalogStore>(
    engine: &SyncEngine<S>,
    storage: &dyn ResultStorage,
) -> Result<SyncSummary> {
    let result = storage.load_result().await?;
    Ok(engine.sync_all(&result.products).await)
}

/// Plan a sync of the stored artifact without writing anything remotely.
pub async fn run_dry_run<S: CatalogStore>(
    engine: &SyncEngine<S>,
    storage: &dyn ResultStorage,
) -> Result<SyncPlan> {
    let result = storage.load_result().await?;
    Ok(plan_all(engine, &result.products).await)
}

/// Resolve the action for each product, in order.
pub async fn plan_all<S: CatalogStore>(engine: &SyncEngine<S>, products: &[Product]) -> SyncPlan {
    let mut plan = SyncPlan::default();
    for product in products {
        let sku = product.catalog_number();
        match engine.plan(product).await {
            Ok(action) => {
                log::info!("[dry-run] {sku}: {action:?}");
                plan.record(action);
            }
            Err(e) => {
                log::warn!("[dry-run] {sku}: lookup failed: {e}");
                plan.failures.push(SyncFailure {
                    sku: sku.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    log::info!(
        "Dry run: {} to create, {} to update, {} to recreate from trash, {} lookups failed",
        plan.create,
        plan.update,
        plan.recreate,
        plan.failures.len()
    );
    plan
}
