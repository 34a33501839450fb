//! Relief Engine - Resource Shortage & Allocation
//!
//! The decision core of a disaster relief coordination system: computes
//! per-camp resource shortages, classifies their severity, and greedily
//! matches pending donations to the camps with greatest need while
//! maintaining quantity-conservation invariants across donations,
//! allocations, and camp inventories.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  External CRUD / Web Layer                      │
//! │            (forms, dashboards, exports - not here)              │
//! └──────────────────────────────┬──────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┴──────────────────────────────────┐
//! │                        ReliefEngine                             │
//! │  ┌───────────────┐  ┌──────────────────┐  ┌──────────────────┐  │
//! │  │   Shortage    │  │    Allocation    │  │    Statistics    │  │
//! │  │  Calculator   │  │      Engine      │  │    Aggregator    │  │
//! │  └───────┬───────┘  └────────┬─────────┘  └────────┬─────────┘  │
//! │          │              ┌────┴─────┐               │            │
//! │          │              │   Lock   │               │            │
//! │          │              │ Manager  │               │            │
//! │          │              └────┬─────┘               │            │
//! └──────────┼───────────────────┼─────────────────────┼────────────┘
//!            │                   │                     │
//! ┌──────────┴───────────────────┴─────────────────────┴────────────┐
//! │            Store Ports (InventoryStore / DonationLedger)        │
//! │              MemoryStore or an external adapter                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`engine`]: the [`ReliefEngine`] facade the caller drives
//! - [`shortage`]: shortage views and severity classification
//! - [`allocation`]: the atomic allocation primitive and the greedy matcher
//! - [`stats`]: fail-open dashboard aggregates
//! - [`domain`]: entities and store ports
//! - [`store`]: the in-memory reference store
//! - [`error`]: error types and handling

pub mod allocation;
pub mod domain;
pub mod engine;
pub mod error;
pub mod shortage;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use engine::{EngineConfig, EngineStatus, ReliefEngine};

pub use allocation::{AutoAllocateReport, DonationAllocator, LockManager};

pub use domain::{
    summarize_donations, Allocation, AllocationId, Camp, CampId, Disaster, DisasterId, Donation,
    DonationId, DonationStatus, DonationSummary, Resource, ResourceId, ResourceRecord,
    ResourceType, ResourceTypeId,
};

pub use domain::ports::{
    AllocationCommit, DonationLedger, DonationLedgerRef, InventoryStore, InventoryStoreRef,
    ReliefStore, ReliefStoreRef,
};

pub use error::{Error, Result};

pub use shortage::{
    classify_severity, shortage_ratio, Severity, ShortageCalculator, ShortageRatio, ShortageView,
    CRITICAL_NEED_MULTIPLIER, HIGH_NEED_MULTIPLIER,
};

pub use stats::{DonationStatistics, ResourceStatistics, StatsAggregator};

pub use store::MemoryStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
