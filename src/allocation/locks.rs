//! Allocation lock manager
//!
//! Mutual exclusion for the allocation primitive, keyed by donation and by
//! (camp, resource type). Two concurrent attempts against the same donation
//! or the same inventory row must serialize so the remaining-quantity check
//! and the commit are not split by a race.
//!
//! Lock order is fixed globally: donation lock before camp-resource lock.
//! Callers must never acquire them in the other direction.

use crate::domain::{CampId, DonationId, ResourceTypeId};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-key async mutexes.
///
/// Entries are created on first use and kept for the lifetime of the
/// manager; the population is bounded by the number of donations and
/// inventory rows.
#[derive(Default)]
pub struct LockManager {
    donations: DashMap<DonationId, Arc<Mutex<()>>>,
    resources: DashMap<(CampId, ResourceTypeId), Arc<Mutex<()>>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the per-donation lock. Must be taken before any
    /// camp-resource lock.
    pub async fn lock_donation(&self, donation_id: DonationId) -> OwnedMutexGuard<()> {
        let lock = self
            .donations
            .entry(donation_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Acquire the per-(camp, resource type) lock. The caller must already
    /// hold the donation lock.
    pub async fn lock_resource(
        &self,
        camp_id: CampId,
        resource_type_id: ResourceTypeId,
    ) -> OwnedMutexGuard<()> {
        let lock = self
            .resources
            .entry((camp_id, resource_type_id))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
