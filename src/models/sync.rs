//! Reconciliation decisions, outcomes and tallies.

use serde::Serialize;

/// Where a SKU currently lives on the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    NotFound,
    Active(u64),
    Trashed(u64),
}

/// What the engine will do for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Create,
    Update(u64),
    /// Force-delete the trashed entry, then create a fresh one.
    RecreateFromTrash(u64),
}

impl From<Lookup> for SyncAction {
    fn from(lookup: Lookup) -> Self {
        match lookup {
            Lookup::NotFound => Self::Create,
            Lookup::Active(id) => Self::Update(id),
            Lookup::Trashed(id) => Self::RecreateFromTrash(id),
        }
    }
}

/// Result of reconciling one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    Failed(String),
}

/// A product that could not be synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub sku: String,
    pub message: String,
}

/// Counts of reconciliation outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncTally {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncTally {
    /// Count one outcome.
    pub fn record(&mut self, sku: &str, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::Failed(message) => {
                self.failed += 1;
                self.failures.push(SyncFailure {
                    sku: sku.to_string(),
                    message,
                });
            }
        }
    }

    /// Add another tally into this one.
    pub fn merge(&mut self, other: &SyncTally) {
        self.created += other.created;
        self.updated += other.updated;
        self.failed += other.failed;
        self.failures.extend(other.failures.iter().cloned());
    }

    /// Number of products processed.
    pub fn total(&self) -> usize {
        self.created + self.updated + self.failed
    }
}

/// Per-batch and cumulative tallies of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub batches: Vec<SyncTally>,
    pub total: SyncTally,
}
