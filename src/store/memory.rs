//! In-Memory Relief Store
//!
//! In-process implementation of the inventory and ledger ports behind a
//! single interior lock. `commit_allocation` applies the allocation row,
//! the status transition, and the inventory credit in one critical
//! section, so the transactional-unit contract holds without an external
//! database.
//!
//! Also carries the seeding/CRUD helpers the excluded web layer would
//! normally drive; tests and benches use them directly.

use crate::domain::ports::{AllocationCommit, DonationLedger, InventoryStore, ReliefStore};
use crate::domain::{
    summarize_donations, Allocation, AllocationId, Camp, CampId, Disaster, DisasterId, Donation,
    DonationId, DonationStatus, DonationSummary, Resource, ResourceId, ResourceRecord,
    ResourceType, ResourceTypeId,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;

// =============================================================================
// Inner State
// =============================================================================

#[derive(Default)]
struct Inner {
    disasters: BTreeMap<DisasterId, Disaster>,
    camps: BTreeMap<CampId, Camp>,
    resource_types: BTreeMap<ResourceTypeId, ResourceType>,
    resources: BTreeMap<ResourceId, Resource>,
    donations: BTreeMap<DonationId, Donation>,
    /// Ledger order; allocations are append-only
    allocations: Vec<Allocation>,
    next_id: u64,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn resource_for_mut(
        &mut self,
        camp_id: CampId,
        resource_type_id: ResourceTypeId,
    ) -> Option<&mut Resource> {
        self.resources
            .values_mut()
            .find(|r| r.camp_id == camp_id && r.resource_type_id == resource_type_id)
    }

    fn remaining_for(&self, donation: &Donation) -> u64 {
        let allocated: u64 = self
            .allocations
            .iter()
            .filter(|a| a.donation_id == donation.id)
            .map(|a| a.quantity_allocated)
            .sum();
        donation.quantity_donated.saturating_sub(allocated)
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// In-memory store implementing all relief engine ports
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Seeding / CRUD helpers (the external layer's write path)
    // =========================================================================

    pub fn add_disaster(
        &self,
        name: &str,
        kind: &str,
        location: &str,
        severity: &str,
    ) -> DisasterId {
        let mut inner = self.inner.write();
        let id = DisasterId(inner.next_id());
        inner.disasters.insert(
            id,
            Disaster {
                id,
                name: name.to_string(),
                kind: kind.to_string(),
                location: location.to_string(),
                severity: severity.to_string(),
                active: true,
            },
        );
        id
    }

    pub fn add_camp(
        &self,
        disaster_id: DisasterId,
        name: &str,
        location: &str,
        capacity: u32,
    ) -> CampId {
        let mut inner = self.inner.write();
        let id = CampId(inner.next_id());
        inner.camps.insert(
            id,
            Camp {
                id,
                disaster_id,
                name: name.to_string(),
                location: location.to_string(),
                capacity,
                current_occupancy: 0,
            },
        );
        id
    }

    pub fn add_resource_type(&self, type_name: &str, unit: &str) -> ResourceTypeId {
        let mut inner = self.inner.write();
        let id = ResourceTypeId(inner.next_id());
        inner.resource_types.insert(
            id,
            ResourceType {
                id,
                type_name: type_name.to_string(),
                unit: unit.to_string(),
            },
        );
        id
    }

    /// Create or overwrite the inventory row for one (camp, resource type)
    /// pair. One row per pair is a store invariant.
    pub fn upsert_resource(
        &self,
        camp_id: CampId,
        resource_type_id: ResourceTypeId,
        available: u64,
        needed: u64,
    ) -> Result<ResourceId> {
        let mut inner = self.inner.write();
        if !inner.camps.contains_key(&camp_id) {
            return Err(Error::CampNotFound { camp_id });
        }
        if !inner.resource_types.contains_key(&resource_type_id) {
            return Err(Error::ResourceTypeNotFound { resource_type_id });
        }

        if let Some(existing) = inner.resource_for_mut(camp_id, resource_type_id) {
            existing.quantity_available = available;
            existing.quantity_needed = needed;
            return Ok(existing.id);
        }

        let id = ResourceId(inner.next_id());
        inner.resources.insert(
            id,
            Resource {
                id,
                camp_id,
                resource_type_id,
                quantity_available: available,
                quantity_needed: needed,
            },
        );
        Ok(id)
    }

    /// Record a donation stamped with the current time
    pub fn add_donation(
        &self,
        donor_name: &str,
        donor_contact: &str,
        resource_type_id: ResourceTypeId,
        quantity: u64,
        notes: &str,
    ) -> Result<DonationId> {
        self.add_donation_at(
            donor_name,
            donor_contact,
            resource_type_id,
            quantity,
            notes,
            Utc::now(),
        )
    }

    /// Record a donation with an explicit timestamp
    pub fn add_donation_at(
        &self,
        donor_name: &str,
        donor_contact: &str,
        resource_type_id: ResourceTypeId,
        quantity: u64,
        notes: &str,
        donated_at: DateTime<Utc>,
    ) -> Result<DonationId> {
        if donor_name.is_empty() {
            return Err(Error::Internal("donor name is required".into()));
        }
        if quantity == 0 {
            return Err(Error::InvalidQuantity {
                requested: 0,
                remaining: 0,
            });
        }

        let mut inner = self.inner.write();
        if !inner.resource_types.contains_key(&resource_type_id) {
            return Err(Error::ResourceTypeNotFound { resource_type_id });
        }

        let id = DonationId(inner.next_id());
        inner.donations.insert(
            id,
            Donation {
                id,
                donor_name: donor_name.to_string(),
                donor_contact: donor_contact.to_string(),
                resource_type_id,
                quantity_donated: quantity,
                status: DonationStatus::Pending,
                donated_at,
                notes: notes.to_string(),
            },
        );
        Ok(id)
    }

    // =========================================================================
    // Synchronous read helpers
    // =========================================================================

    /// The inventory row for one (camp, resource type) pair, if present
    pub fn resource_for(
        &self,
        camp_id: CampId,
        resource_type_id: ResourceTypeId,
    ) -> Option<Resource> {
        self.inner
            .read()
            .resources
            .values()
            .find(|r| r.camp_id == camp_id && r.resource_type_id == resource_type_id)
            .cloned()
    }

    /// One donation with derived allocation totals
    pub fn donation_summary(&self, donation_id: DonationId) -> Result<DonationSummary> {
        let inner = self.inner.read();
        let donation = inner
            .donations
            .get(&donation_id)
            .ok_or(Error::DonationNotFound { donation_id })?;
        let allocations: Vec<Allocation> = inner
            .allocations
            .iter()
            .filter(|a| a.donation_id == donation_id)
            .cloned()
            .collect();
        Ok(summarize_donations(std::slice::from_ref(donation), &allocations).remove(0))
    }

    /// All donations with derived allocation totals, in ledger order
    pub fn donation_summaries(&self) -> Result<Vec<DonationSummary>> {
        let inner = self.inner.read();
        let donations: Vec<Donation> = inner.donations.values().cloned().collect();
        Ok(summarize_donations(&donations, &inner.allocations))
    }
}

// =============================================================================
// InventoryStore Implementation
// =============================================================================

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn list_resources(&self) -> Result<Vec<ResourceRecord>> {
        let inner = self.inner.read();
        Ok(inner
            .resources
            .values()
            .filter_map(|resource| {
                let resource_type = inner.resource_types.get(&resource.resource_type_id)?;
                let camp = inner.camps.get(&resource.camp_id)?;
                let disaster_name = inner
                    .disasters
                    .get(&camp.disaster_id)
                    .map(|d| d.name.clone())
                    .unwrap_or_default();
                Some(ResourceRecord {
                    resource: resource.clone(),
                    type_name: resource_type.type_name.clone(),
                    unit: resource_type.unit.clone(),
                    camp_name: camp.name.clone(),
                    disaster_name,
                })
            })
            .collect())
    }

    async fn list_resource_types(&self) -> Result<Vec<ResourceType>> {
        Ok(self.inner.read().resource_types.values().cloned().collect())
    }

    async fn list_camps(&self) -> Result<Vec<Camp>> {
        Ok(self.inner.read().camps.values().cloned().collect())
    }

    async fn set_quantities(
        &self,
        resource_id: ResourceId,
        available: u64,
        needed: u64,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        let resource = inner
            .resources
            .get_mut(&resource_id)
            .ok_or(Error::ResourceRowNotFound { resource_id })?;
        resource.quantity_available = available;
        resource.quantity_needed = needed;
        Ok(())
    }

    async fn increment_available(
        &self,
        camp_id: CampId,
        resource_type_id: ResourceTypeId,
        delta: u64,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        let resource = inner
            .resource_for_mut(camp_id, resource_type_id)
            .ok_or(Error::ResourceNotFound {
                camp_id,
                resource_type_id,
            })?;
        resource.quantity_available += delta;
        Ok(())
    }
}

// =============================================================================
// DonationLedger Implementation
// =============================================================================

#[async_trait]
impl DonationLedger for MemoryStore {
    async fn list_donations(&self) -> Result<Vec<Donation>> {
        Ok(self.inner.read().donations.values().cloned().collect())
    }

    async fn list_allocations(&self) -> Result<Vec<Allocation>> {
        Ok(self.inner.read().allocations.clone())
    }

    async fn allocations_for(&self, donation_id: DonationId) -> Result<Vec<Allocation>> {
        Ok(self
            .inner
            .read()
            .allocations
            .iter()
            .filter(|a| a.donation_id == donation_id)
            .cloned()
            .collect())
    }

    async fn get_donation(&self, donation_id: DonationId) -> Result<Option<Donation>> {
        Ok(self.inner.read().donations.get(&donation_id).cloned())
    }

    async fn set_donation_status(
        &self,
        donation_id: DonationId,
        status: DonationStatus,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        let donation = inner
            .donations
            .get_mut(&donation_id)
            .ok_or(Error::DonationNotFound { donation_id })?;
        donation.status = status;
        Ok(())
    }
}

// =============================================================================
// ReliefStore Implementation
// =============================================================================

#[async_trait]
impl ReliefStore for MemoryStore {
    async fn commit_allocation(&self, commit: AllocationCommit) -> Result<Allocation> {
        let mut inner = self.inner.write();

        let donation = inner
            .donations
            .get(&commit.donation_id)
            .ok_or(Error::DonationNotFound {
                donation_id: commit.donation_id,
            })?
            .clone();

        // Re-derive the remainder inside the critical section; a stale
        // expectation means the caller lost a race.
        let remaining = inner.remaining_for(&donation);
        if remaining != commit.expected_remaining {
            return Err(Error::ConflictRace {
                donation_id: commit.donation_id,
            });
        }
        if commit.quantity == 0 || commit.quantity > remaining {
            return Err(Error::InvalidQuantity {
                requested: commit.quantity,
                remaining,
            });
        }

        // Validate the inventory target before any write so a failure
        // leaves the ledger untouched.
        if inner
            .resource_for_mut(commit.camp_id, commit.resource_type_id)
            .is_none()
        {
            return Err(Error::ResourceNotFound {
                camp_id: commit.camp_id,
                resource_type_id: commit.resource_type_id,
            });
        }

        let allocation = Allocation {
            id: AllocationId(inner.next_id()),
            donation_id: commit.donation_id,
            camp_id: commit.camp_id,
            quantity_allocated: commit.quantity,
            allocated_at: Utc::now(),
        };
        inner.allocations.push(allocation.clone());

        if remaining - commit.quantity == 0 {
            if let Some(donation) = inner.donations.get_mut(&commit.donation_id) {
                donation.status = DonationStatus::Allocated;
            }
        }

        if let Some(resource) = inner.resource_for_mut(commit.camp_id, commit.resource_type_id) {
            resource.quantity_available += commit.quantity;
        }

        Ok(allocation)
    }
}
