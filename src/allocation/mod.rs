//! Donation allocation
//!
//! Converts donor supply into camp relief while enforcing the
//! quantity-conservation invariants across the donation ledger and camp
//! inventories.

pub mod engine;
pub mod locks;

pub use engine::{AutoAllocateReport, DonationAllocator};
pub use locks::LockManager;
