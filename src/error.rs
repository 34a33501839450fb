//! Error types for the relief allocation engine
//!
//! Provides structured error types for all engine components including
//! shortage calculation, donation allocation, and statistics aggregation.

use crate::domain::{CampId, DonationId, ResourceId, ResourceTypeId};
use thiserror::Error;

/// Unified error type for the engine
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    // =========================================================================
    // Not-Found Errors
    // =========================================================================
    #[error("Donation not found: {donation_id}")]
    DonationNotFound { donation_id: DonationId },

    #[error("Camp not found: {camp_id}")]
    CampNotFound { camp_id: CampId },

    #[error("No inventory record for camp {camp_id}, resource type {resource_type_id}")]
    ResourceNotFound {
        camp_id: CampId,
        resource_type_id: ResourceTypeId,
    },

    #[error("Resource type not found: {resource_type_id}")]
    ResourceTypeNotFound { resource_type_id: ResourceTypeId },

    #[error("Inventory row not found: {resource_id}")]
    ResourceRowNotFound { resource_id: ResourceId },

    // =========================================================================
    // Allocation Errors
    // =========================================================================
    #[error("Invalid allocation quantity: requested {requested}, remaining {remaining}")]
    InvalidQuantity { requested: u64, remaining: u64 },

    #[error("Concurrent modification of donation {donation_id} detected at commit")]
    ConflictRace { donation_id: DonationId },

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl Error {
    /// Check if this error is any of the not-found variants
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::DonationNotFound { .. }
                | Error::CampNotFound { .. }
                | Error::ResourceNotFound { .. }
                | Error::ResourceTypeNotFound { .. }
                | Error::ResourceRowNotFound { .. }
        )
    }

    /// Check if the failed operation may be retried by the engine.
    ///
    /// Only commit-time conflicts qualify; the engine retries the atomic
    /// primitive exactly once before surfacing the conflict.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ConflictRace { .. })
    }

    /// Check if this error is transient (collaborator outage or a lost
    /// commit race, not a contract violation). Statistics paths degrade to
    /// empty aggregates on transient failures instead of crashing.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::StoreUnavailable(_) | Error::ConflictRace { .. }
        )
    }
}

/// Result type alias for the engine
pub type Result<T> = std::result::Result<T, Error>;
