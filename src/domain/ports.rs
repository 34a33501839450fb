//! Domain Ports - Core trait definitions for the relief engine
//!
//! These traits define the boundaries between the engine and the external
//! inventory/ledger stores. Adapters implement these traits to provide
//! concrete functionality; the in-process reference adapter lives in
//! [`crate::store::memory`].

use crate::domain::{
    Allocation, Camp, CampId, Donation, DonationId, DonationStatus, ResourceId, ResourceRecord,
    ResourceType, ResourceTypeId,
};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// Allocation Commit
// =============================================================================

/// One fully-validated allocation, applied by the store as a single
/// transactional unit: insert the allocation row, flip the donation to
/// `Allocated` when its remainder reaches zero, and credit the target
/// camp's inventory.
///
/// `expected_remaining` is the donation's remaining quantity as observed by
/// the engine under its locks. The store re-derives the remainder at commit
/// time and answers [`crate::error::Error::ConflictRace`] on mismatch, so
/// that a check-then-act split against a store shared with other writers
/// cannot over-allocate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationCommit {
    pub donation_id: DonationId,
    pub camp_id: CampId,
    pub resource_type_id: ResourceTypeId,
    pub quantity: u64,
    pub expected_remaining: u64,
}

// =============================================================================
// Inventory Store Port
// =============================================================================

/// Port for camp inventory reads and writes
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// All inventory rows joined with camp and resource-type metadata
    async fn list_resources(&self) -> Result<Vec<ResourceRecord>>;

    /// All known resource types
    async fn list_resource_types(&self) -> Result<Vec<ResourceType>>;

    /// All known camps
    async fn list_camps(&self) -> Result<Vec<Camp>>;

    /// Manual inventory adjustment: overwrite both quantities of one row.
    /// This is the external correction path, not an engine operation.
    async fn set_quantities(&self, resource_id: ResourceId, available: u64, needed: u64)
        -> Result<()>;

    /// Credit a camp's available quantity for one resource type
    async fn increment_available(
        &self,
        camp_id: CampId,
        resource_type_id: ResourceTypeId,
        delta: u64,
    ) -> Result<()>;
}

// =============================================================================
// Donation Ledger Port
// =============================================================================

/// Port for donation and allocation ledger reads and writes
#[async_trait]
pub trait DonationLedger: Send + Sync {
    /// All donations in ledger (insertion) order
    async fn list_donations(&self) -> Result<Vec<Donation>>;

    /// All allocation rows in ledger order
    async fn list_allocations(&self) -> Result<Vec<Allocation>>;

    /// Allocation rows recorded against one donation
    async fn allocations_for(&self, donation_id: DonationId) -> Result<Vec<Allocation>>;

    /// Fetch one donation
    async fn get_donation(&self, donation_id: DonationId) -> Result<Option<Donation>>;

    /// Update a donation's lifecycle status
    async fn set_donation_status(
        &self,
        donation_id: DonationId,
        status: DonationStatus,
    ) -> Result<()>;
}

// =============================================================================
// Combined Relief Store Port
// =============================================================================

/// The transactional store abstraction the allocation engine runs against.
///
/// `commit_allocation` must be all-or-nothing: either the allocation row,
/// the status transition, and the inventory credit all commit, or none do.
#[async_trait]
pub trait ReliefStore: InventoryStore + DonationLedger {
    /// Apply one allocation as a single transactional unit
    async fn commit_allocation(&self, commit: AllocationCommit) -> Result<Allocation>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type InventoryStoreRef = Arc<dyn InventoryStore>;
pub type DonationLedgerRef = Arc<dyn DonationLedger>;
pub type ReliefStoreRef = Arc<dyn ReliefStore>;
