//! Per-campaign mutual-exclusion domain
//!
//! Every mutation of a pledge or its owning campaign happens inside the
//! campaign's lock: idempotency lookups and status checks share the guard
//! with the write they protect, so duplicate deliveries arriving
//! near-simultaneously cannot race a check-then-act window. Disjoint
//! campaigns take disjoint locks and proceed fully in parallel.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Keyed lock registry scoped to campaign ids
#[derive(Default)]
pub struct CampaignLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl CampaignLocks {
    /// Create an empty lock registry
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the serialized scope for a campaign
    ///
    /// The guard is owned, so it can be held across await points for the
    /// duration of the reconciliation unit of work.
    pub async fn acquire(&self, campaign_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(campaign_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
