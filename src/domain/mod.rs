//! Domain layer - Core entities and port definitions
//!
//! This module defines the entities shared by the shortage calculator,
//! allocation engine, and statistics aggregator, plus the traits (ports)
//! that store adapters implement, following hexagonal architecture
//! principles.

pub mod ports;

pub use ports::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Identifiers
// =============================================================================

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Unique identifier for a disaster
    DisasterId
);
id_type!(
    /// Unique identifier for a relief camp
    CampId
);
id_type!(
    /// Unique identifier for a resource type
    ResourceTypeId
);
id_type!(
    /// Unique identifier for a camp inventory row
    ResourceId
);
id_type!(
    /// Unique identifier for a donation
    DonationId
);
id_type!(
    /// Unique identifier for an allocation
    AllocationId
);

// =============================================================================
// Reference Data
// =============================================================================

/// A disaster event that relief camps are attached to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disaster {
    pub id: DisasterId,
    pub name: String,
    /// Kind of disaster (flood, earthquake, ...)
    pub kind: String,
    pub location: String,
    pub severity: String,
    pub active: bool,
}

/// A physical relief site associated with one disaster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camp {
    pub id: CampId,
    pub disaster_id: DisasterId,
    pub name: String,
    pub location: String,
    pub capacity: u32,
    pub current_occupancy: u32,
}

/// Immutable reference data describing a kind of relief resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceType {
    pub id: ResourceTypeId,
    pub type_name: String,
    /// Unit of measure (boxes, litres, kits, ...)
    pub unit: String,
}

// =============================================================================
// Inventory
// =============================================================================

/// A (camp, resource type) inventory row tracking available vs. needed
/// quantity. One row per pair; quantities can never go negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub camp_id: CampId,
    pub resource_type_id: ResourceTypeId,
    pub quantity_available: u64,
    pub quantity_needed: u64,
}

/// An inventory row joined with camp and resource-type metadata, as
/// returned by [`ports::InventoryStore::list_resources`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub resource: Resource,
    pub type_name: String,
    pub unit: String,
    pub camp_name: String,
    pub disaster_name: String,
}

// =============================================================================
// Donations and Allocations
// =============================================================================

/// Lifecycle status of a donation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DonationStatus {
    Pending,
    Received,
    Allocated,
    Distributed,
}

impl std::fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DonationStatus::Pending => write!(f, "Pending"),
            DonationStatus::Received => write!(f, "Received"),
            DonationStatus::Allocated => write!(f, "Allocated"),
            DonationStatus::Distributed => write!(f, "Distributed"),
        }
    }
}

/// A donor-supplied quantity of one resource type, awaiting allocation.
///
/// `quantity_donated` is immutable once recorded. The unallocated remainder
/// is never stored; it is derived from allocation rows at read time (see
/// [`summarize_donations`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: DonationId,
    pub donor_name: String,
    pub donor_contact: String,
    pub resource_type_id: ResourceTypeId,
    pub quantity_donated: u64,
    pub status: DonationStatus,
    pub donated_at: DateTime<Utc>,
    pub notes: String,
}

/// A committed transfer of part of a donation to a specific camp.
/// Immutable once created; corrections are a business process outside
/// the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub donation_id: DonationId,
    pub camp_id: CampId,
    pub quantity_allocated: u64,
    pub allocated_at: DateTime<Utc>,
}

/// A donation together with its derived allocation totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationSummary {
    pub donation: Donation,
    /// Sum of allocation quantities recorded against this donation
    pub allocated_quantity: u64,
    /// `quantity_donated - allocated_quantity`
    pub remaining_quantity: u64,
}

/// Derive per-donation allocation totals from raw ledger rows.
///
/// Donations come back in their input (ledger) order. The subtraction
/// saturates: an over-allocated ledger is a store-level invariant
/// violation, and reads must not panic on it.
pub fn summarize_donations(
    donations: &[Donation],
    allocations: &[Allocation],
) -> Vec<DonationSummary> {
    let mut allocated: HashMap<DonationId, u64> = HashMap::new();
    for alloc in allocations {
        *allocated.entry(alloc.donation_id).or_insert(0) += alloc.quantity_allocated;
    }

    donations
        .iter()
        .map(|donation| {
            let allocated_quantity = allocated.get(&donation.id).copied().unwrap_or(0);
            DonationSummary {
                remaining_quantity: donation.quantity_donated.saturating_sub(allocated_quantity),
                allocated_quantity,
                donation: donation.clone(),
            }
        })
        .collect()
}
