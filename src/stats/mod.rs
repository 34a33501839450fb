//! Read-side statistics
//!
//! Fail-open folds over shortages, donations, and allocations for
//! dashboards. Nothing here mutates state, and a failing underlying read
//! degrades to an empty aggregate instead of crashing the caller.

pub mod aggregator;

pub use aggregator::{
    AllocationSummaryRow, DailyDonations, DonationStatistics, DonationTrends, DonorTotals,
    ResourceStatistics, StatsAggregator, TypeDonationStats,
};
