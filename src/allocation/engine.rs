//! Donation Allocation Engine
//!
//! Matches donor supply against camp shortages. Exposes the atomic
//! single-allocation primitive and the greedy batch matcher built on it.

use crate::allocation::locks::LockManager;
use crate::domain::ports::{AllocationCommit, ReliefStore, ReliefStoreRef};
use crate::domain::{
    summarize_donations, Allocation, CampId, Donation, DonationId, DonationStatus,
};
use crate::error::{Error, Result};
use crate::shortage::calculator::{sort_by_need, ShortageCalculator, ShortageView};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

// =============================================================================
// Auto-Allocation Report
// =============================================================================

/// Outcome of one `auto_allocate` pass. The batch never fails as a whole;
/// zero allocations is a valid, non-error outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoAllocateReport {
    pub allocations_made: usize,
    pub message: String,
}

// =============================================================================
// Donation Allocator
// =============================================================================

/// Allocation engine over an injected relief store.
///
/// All writes go through [`ReliefStore::commit_allocation`] under the
/// per-donation and per-(camp, resource type) locks, in that fixed order.
pub struct DonationAllocator {
    store: ReliefStoreRef,
    calculator: ShortageCalculator,
    locks: LockManager,
    /// Commit retries after a lost race. The engine retries once, then
    /// surfaces the conflict.
    conflict_retry_limit: u32,
}

impl DonationAllocator {
    /// Create a new allocator over a store
    pub fn new<S: ReliefStore + 'static>(store: Arc<S>, conflict_retry_limit: u32) -> Arc<Self> {
        let calculator = ShortageCalculator::new(store.clone());
        Arc::new(Self {
            store,
            calculator,
            locks: LockManager::new(),
            conflict_retry_limit,
        })
    }

    /// Allocate part of a donation to one camp - the atomic primitive.
    ///
    /// The remaining quantity is computed fresh under the locks, never
    /// cached. Either the allocation row, the status transition, and the
    /// inventory credit all commit, or none do.
    pub async fn allocate_to_camp(
        &self,
        donation_id: DonationId,
        camp_id: CampId,
        quantity: u64,
    ) -> Result<Allocation> {
        if quantity == 0 {
            return Err(Error::InvalidQuantity {
                requested: 0,
                remaining: 0,
            });
        }

        // Donation lock strictly before the camp-resource lock.
        let _donation_guard = self.locks.lock_donation(donation_id).await;

        let donation = self
            .store
            .get_donation(donation_id)
            .await?
            .ok_or(Error::DonationNotFound { donation_id })?;

        let _resource_guard = self
            .locks
            .lock_resource(camp_id, donation.resource_type_id)
            .await;

        let mut attempts = 0u32;
        loop {
            let remaining = self.remaining_quantity(&donation).await?;
            if quantity > remaining {
                return Err(Error::InvalidQuantity {
                    requested: quantity,
                    remaining,
                });
            }

            let commit = AllocationCommit {
                donation_id,
                camp_id,
                resource_type_id: donation.resource_type_id,
                quantity,
                expected_remaining: remaining,
            };

            match self.store.commit_allocation(commit).await {
                Ok(allocation) => {
                    debug!(
                        "Allocated {} units of donation {} to camp {}",
                        quantity, donation_id, camp_id
                    );
                    return Ok(allocation);
                }
                Err(e) if e.is_retryable() && attempts < self.conflict_retry_limit => {
                    attempts += 1;
                    warn!(
                        "Commit race on donation {}, retrying ({}/{})",
                        donation_id, attempts, self.conflict_retry_limit
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Run the greedy batch matcher over all pending donations.
    ///
    /// Donations are processed in ledger order, first-registered-first-served,
    /// never re-sorted. For each donation the shortage view is recomputed
    /// fresh, restricted to the donation's resource type, and walked from the
    /// most under-supplied camp down. A failed attempt is logged and skipped;
    /// the batch runs to completion over its snapshot and is idempotent with
    /// respect to already-satisfied shortages.
    pub async fn auto_allocate(&self) -> Result<AutoAllocateReport> {
        info!("Starting auto-allocation pass");

        let donations = self.store.list_donations().await?;
        let allocations = self.store.list_allocations().await?;
        let pending: Vec<_> = summarize_donations(&donations, &allocations)
            .into_iter()
            .filter(|s| s.donation.status == DonationStatus::Pending && s.remaining_quantity > 0)
            .collect();

        debug!("{} pending donations with remaining quantity", pending.len());

        let mut allocations_made = 0usize;
        for summary in &pending {
            let donation = &summary.donation;
            let mut remaining = summary.remaining_quantity;

            let mut matching = match self.matching_shortages(donation).await {
                Ok(shortages) => shortages,
                Err(e) => {
                    warn!(
                        "Skipping donation {}: shortage snapshot failed: {}",
                        donation.id, e
                    );
                    continue;
                }
            };
            sort_by_need(&mut matching);

            for shortage in &matching {
                if remaining == 0 {
                    break;
                }

                let amount = remaining.min(shortage.shortage_amount);
                if amount == 0 {
                    continue;
                }

                match self
                    .allocate_to_camp(donation.id, shortage.camp_id, amount)
                    .await
                {
                    Ok(_) => {
                        allocations_made += 1;
                        remaining -= amount;
                    }
                    Err(e) => {
                        warn!(
                            "Allocation of {} units from donation {} to camp {} failed: {}",
                            amount, donation.id, shortage.camp_id, e
                        );
                    }
                }
            }
        }

        let message = if allocations_made > 0 {
            format!(
                "Auto-allocation completed. {} allocations made.",
                allocations_made
            )
        } else {
            "No allocations needed at this time.".to_string()
        };
        info!("Auto-allocation pass finished: {} allocations", allocations_made);

        Ok(AutoAllocateReport {
            allocations_made,
            message,
        })
    }

    /// Fresh shortage view restricted to the donation's resource type
    async fn matching_shortages(&self, donation: &Donation) -> Result<Vec<ShortageView>> {
        let shortages = self.calculator.compute_shortages().await?;
        Ok(shortages
            .into_iter()
            .filter(|s| s.resource_type_id == donation.resource_type_id)
            .collect())
    }

    /// Derived remaining quantity, read fresh from the ledger
    async fn remaining_quantity(&self, donation: &Donation) -> Result<u64> {
        let allocations = self.store.allocations_for(donation.id).await?;
        let allocated: u64 = allocations.iter().map(|a| a.quantity_allocated).sum();
        Ok(donation.quantity_donated.saturating_sub(allocated))
    }
}
