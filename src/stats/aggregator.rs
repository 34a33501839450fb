//! Statistics Aggregator
//!
//! Pure read-side folds shared by every dashboard surface. Severity counts
//! here use the same classifier as the allocation priority, so "critical"
//! can never mean two different things on one screen.

use crate::domain::ports::{DonationLedger, DonationLedgerRef, InventoryStore, InventoryStoreRef};
use crate::domain::{Allocation, DonationStatus};
use crate::error::Result;
use crate::shortage::calculator::{sort_by_need, ShortageCalculator, ShortageView};
use crate::shortage::severity::Severity;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::error;

// =============================================================================
// Report Types
// =============================================================================

/// Shortage counters for the resource dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceStatistics {
    pub total_resource_types: usize,
    pub total_shortages: usize,
    /// Shortages classified High or Critical
    pub critical_shortages: usize,
    /// Shortage counts per resource type name, first-appearance order
    pub shortages_by_type: IndexMap<String, usize>,
    pub top_shortages: Vec<ShortageView>,
}

/// Donation counts and sums per resource type
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TypeDonationStats {
    pub count: usize,
    pub quantity: u64,
}

/// One donor's folded totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorTotals {
    pub donor_name: String,
    pub count: usize,
    pub total_quantity: u64,
}

/// Donation counters for the donation dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DonationStatistics {
    pub total_donations: usize,
    pub pending_donations: usize,
    pub received_donations: usize,
    pub allocated_donations: usize,
    pub distributed_donations: usize,
    pub total_donated_quantity: u64,
    /// Counts and sums per resource type name, first-appearance order
    pub donations_by_type: IndexMap<String, TypeDonationStats>,
    /// Top five donors by total quantity; ties keep first-appearance order
    pub top_donors: Vec<DonorTotals>,
}

/// An allocation row joined with donor, type, and camp metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSummaryRow {
    pub allocation: Allocation,
    pub donor_name: String,
    pub quantity_donated: u64,
    pub type_name: String,
    pub unit: String,
    pub camp_name: String,
}

/// Donations folded per calendar day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyDonations {
    pub day: NaiveDate,
    pub donation_count: usize,
    pub total_quantity: u64,
}

/// Thirty-day donation trend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DonationTrends {
    pub daily: Vec<DailyDonations>,
    /// Number of days in the window with at least one donation
    pub total_days: usize,
    /// Active days divided by the 30-day window
    pub average_daily_donations: f64,
    pub total_quantity_period: u64,
}

// =============================================================================
// Stats Aggregator
// =============================================================================

/// Fail-open aggregator over the inventory and ledger read ports.
///
/// A failing underlying read yields the zero-valued aggregate plus a logged
/// error; dashboards degrade, they do not crash.
pub struct StatsAggregator {
    inventory: InventoryStoreRef,
    ledger: DonationLedgerRef,
    calculator: ShortageCalculator,
    top_shortage_limit: usize,
}

impl StatsAggregator {
    pub fn new<S>(store: Arc<S>, top_shortage_limit: usize) -> Self
    where
        S: InventoryStore + DonationLedger + 'static,
    {
        let inventory: InventoryStoreRef = store.clone();
        Self {
            calculator: ShortageCalculator::new(inventory.clone()),
            inventory,
            ledger: store,
            top_shortage_limit,
        }
    }

    /// Shortage counters for the resource dashboard
    pub async fn resource_statistics(&self) -> ResourceStatistics {
        match self.try_resource_statistics().await {
            Ok(stats) => stats,
            Err(e) => {
                error!("Resource statistics degraded to empty: {}", e);
                ResourceStatistics::default()
            }
        }
    }

    async fn try_resource_statistics(&self) -> Result<ResourceStatistics> {
        let (types, shortages) = futures::try_join!(
            self.inventory.list_resource_types(),
            self.calculator.compute_shortages()
        )?;

        let critical_shortages = shortages
            .iter()
            .filter(|s| s.severity != Severity::Normal)
            .count();

        let mut shortages_by_type: IndexMap<String, usize> = IndexMap::new();
        for shortage in &shortages {
            *shortages_by_type
                .entry(shortage.type_name.clone())
                .or_insert(0) += 1;
        }

        let mut top_shortages = shortages.clone();
        sort_by_need(&mut top_shortages);
        top_shortages.truncate(self.top_shortage_limit);

        Ok(ResourceStatistics {
            total_resource_types: types.len(),
            total_shortages: shortages.len(),
            critical_shortages,
            shortages_by_type,
            top_shortages,
        })
    }

    /// Donation counters for the donation dashboard
    pub async fn donation_statistics(&self) -> DonationStatistics {
        match self.try_donation_statistics().await {
            Ok(stats) => stats,
            Err(e) => {
                error!("Donation statistics degraded to empty: {}", e);
                DonationStatistics::default()
            }
        }
    }

    async fn try_donation_statistics(&self) -> Result<DonationStatistics> {
        let (donations, types) = futures::try_join!(
            self.ledger.list_donations(),
            self.inventory.list_resource_types()
        )?;
        let type_names: HashMap<_, _> = types
            .iter()
            .map(|t| (t.id, t.type_name.clone()))
            .collect();

        let mut stats = DonationStatistics {
            total_donations: donations.len(),
            ..Default::default()
        };

        let mut donor_totals: IndexMap<String, DonorTotals> = IndexMap::new();
        for donation in &donations {
            match donation.status {
                DonationStatus::Pending => stats.pending_donations += 1,
                DonationStatus::Received => stats.received_donations += 1,
                DonationStatus::Allocated => stats.allocated_donations += 1,
                DonationStatus::Distributed => stats.distributed_donations += 1,
            }
            stats.total_donated_quantity += donation.quantity_donated;

            let type_name = type_names
                .get(&donation.resource_type_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string());
            let per_type = stats.donations_by_type.entry(type_name).or_default();
            per_type.count += 1;
            per_type.quantity += donation.quantity_donated;

            let totals = donor_totals
                .entry(donation.donor_name.clone())
                .or_insert_with(|| DonorTotals {
                    donor_name: donation.donor_name.clone(),
                    count: 0,
                    total_quantity: 0,
                });
            totals.count += 1;
            totals.total_quantity += donation.quantity_donated;
        }

        // Stable sort over first-appearance order: equal totals keep the
        // earlier donor first.
        let mut top_donors: Vec<DonorTotals> = donor_totals.into_values().collect();
        top_donors.sort_by_key(|d| Reverse(d.total_quantity));
        top_donors.truncate(5);
        stats.top_donors = top_donors;

        Ok(stats)
    }

    /// All allocations joined with donor, type, and camp metadata,
    /// newest first
    pub async fn allocation_summary(&self) -> Vec<AllocationSummaryRow> {
        match self.try_allocation_summary().await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Allocation summary degraded to empty: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_allocation_summary(&self) -> Result<Vec<AllocationSummaryRow>> {
        let (allocations, donations, camps, types) = futures::try_join!(
            self.ledger.list_allocations(),
            self.ledger.list_donations(),
            self.inventory.list_camps(),
            self.inventory.list_resource_types()
        )?;

        let donations: HashMap<_, _> = donations.into_iter().map(|d| (d.id, d)).collect();
        let camps: HashMap<_, _> = camps.into_iter().map(|c| (c.id, c.name)).collect();
        let types: HashMap<_, _> = types.into_iter().map(|t| (t.id, t)).collect();

        let mut rows: Vec<AllocationSummaryRow> = allocations
            .into_iter()
            .filter_map(|allocation| {
                let donation = donations.get(&allocation.donation_id)?;
                let resource_type = types.get(&donation.resource_type_id)?;
                Some(AllocationSummaryRow {
                    donor_name: donation.donor_name.clone(),
                    quantity_donated: donation.quantity_donated,
                    type_name: resource_type.type_name.clone(),
                    unit: resource_type.unit.clone(),
                    camp_name: camps
                        .get(&allocation.camp_id)
                        .cloned()
                        .unwrap_or_else(|| "Unknown".to_string()),
                    allocation,
                })
            })
            .collect();

        rows.sort_by_key(|r| (Reverse(r.allocation.allocated_at), Reverse(r.allocation.id)));
        Ok(rows)
    }

    /// Donation trend over the 30 days before `now`. The clock is an
    /// argument so callers (and tests) control the window.
    pub async fn donation_trends(&self, now: DateTime<Utc>) -> DonationTrends {
        match self.try_donation_trends(now).await {
            Ok(trends) => trends,
            Err(e) => {
                error!("Donation trends degraded to empty: {}", e);
                DonationTrends::default()
            }
        }
    }

    async fn try_donation_trends(&self, now: DateTime<Utc>) -> Result<DonationTrends> {
        let donations = self.ledger.list_donations().await?;
        let window_start = now - Duration::days(30);

        let mut per_day: BTreeMap<NaiveDate, DailyDonations> = BTreeMap::new();
        for donation in donations
            .iter()
            .filter(|d| d.donated_at >= window_start && d.donated_at <= now)
        {
            let day = donation.donated_at.date_naive();
            let entry = per_day.entry(day).or_insert(DailyDonations {
                day,
                donation_count: 0,
                total_quantity: 0,
            });
            entry.donation_count += 1;
            entry.total_quantity += donation.quantity_donated;
        }

        let daily: Vec<DailyDonations> = per_day.into_values().collect();
        let total_days = daily.len();
        let total_quantity_period = daily.iter().map(|d| d.total_quantity).sum();

        Ok(DonationTrends {
            total_days,
            average_daily_donations: total_days as f64 / 30.0,
            total_quantity_period,
            daily,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{DonationLedger, InventoryStore};
    use crate::domain::{
        Allocation, Camp, CampId, Donation, DonationId, DonationStatus, ResourceId,
        ResourceRecord, ResourceType, ResourceTypeId,
    };
    use crate::error::Error;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use chrono::TimeZone;

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let disaster = store.add_disaster("Flood 2024", "flood", "Riverside", "Severe");
        let camp_a = store.add_camp(disaster, "Camp Alpha", "North bank", 500);
        let camp_b = store.add_camp(disaster, "Camp Bravo", "South bank", 300);
        let water = store.add_resource_type("Water", "litres");
        let tents = store.add_resource_type("Tents", "units");

        store.upsert_resource(camp_a, water, 0, 60).unwrap(); // Critical
        store.upsert_resource(camp_b, water, 80, 100).unwrap(); // Normal shortage
        store.upsert_resource(camp_a, tents, 10, 16).unwrap(); // High

        store.add_donation("Red Crescent", "", water, 100, "").unwrap();
        store.add_donation("Local School", "", water, 40, "").unwrap();
        store.add_donation("Red Crescent", "", tents, 20, "").unwrap();
        store
    }

    #[tokio::test]
    async fn test_resource_statistics_counts() {
        let aggregator = StatsAggregator::new(seeded_store(), 5);
        let stats = aggregator.resource_statistics().await;

        assert_eq!(stats.total_resource_types, 2);
        assert_eq!(stats.total_shortages, 3);
        // Critical water row + High tents row; the Normal one is excluded.
        assert_eq!(stats.critical_shortages, 2);
        assert_eq!(stats.shortages_by_type.get("Water"), Some(&2));
        assert_eq!(stats.shortages_by_type.get("Tents"), Some(&1));
        assert_eq!(stats.top_shortages[0].shortage_amount, 60);
    }

    #[tokio::test]
    async fn test_donation_statistics_groups_by_status_and_type() {
        let aggregator = StatsAggregator::new(seeded_store(), 5);
        let stats = aggregator.donation_statistics().await;

        assert_eq!(stats.total_donations, 3);
        assert_eq!(stats.pending_donations, 3);
        assert_eq!(stats.allocated_donations, 0);
        assert_eq!(stats.total_donated_quantity, 160);
        assert_eq!(
            stats.donations_by_type.get("Water").copied().map(|t| t.quantity),
            Some(140)
        );
        assert_eq!(stats.top_donors[0].donor_name, "Red Crescent");
        assert_eq!(stats.top_donors[0].total_quantity, 120);
        assert_eq!(stats.top_donors[0].count, 2);
    }

    #[tokio::test]
    async fn test_top_donor_ties_keep_first_appearance_order() {
        let store = Arc::new(MemoryStore::new());
        let water = store.add_resource_type("Water", "litres");
        store.add_donation("Second Seen", "", water, 30, "").unwrap();
        store.add_donation("First Seen", "", water, 10, "").unwrap();
        store.add_donation("Second Seen", "", water, 10, "").unwrap();
        store.add_donation("First Seen", "", water, 30, "").unwrap();

        let aggregator = StatsAggregator::new(store, 5);
        let stats = aggregator.donation_statistics().await;

        // Both donors total 40; "Second Seen" appeared first in the ledger.
        assert_eq!(stats.top_donors[0].donor_name, "Second Seen");
        assert_eq!(stats.top_donors[1].donor_name, "First Seen");
    }

    #[tokio::test]
    async fn test_allocation_summary_joins_metadata() {
        let store = seeded_store();
        let allocator = crate::allocation::DonationAllocator::new(store.clone(), 1);
        allocator.auto_allocate().await.unwrap();

        let aggregator = StatsAggregator::new(store, 5);
        let rows = aggregator.allocation_summary().await;

        assert!(!rows.is_empty());
        let row = &rows[0];
        assert!(!row.donor_name.is_empty());
        assert!(!row.camp_name.is_empty());
        assert!(row.quantity_donated > 0);
    }

    #[tokio::test]
    async fn test_donation_trends_folds_by_day() {
        let store = Arc::new(MemoryStore::new());
        let water = store.add_resource_type("Water", "litres");
        let day = |d: u32, h: u32| Utc.with_ymd_and_hms(2024, 5, d, h, 0, 0).unwrap();
        store.add_donation_at("A", "", water, 30, "", day(10, 9)).unwrap();
        store.add_donation_at("B", "", water, 20, "", day(10, 15)).unwrap();
        store.add_donation_at("C", "", water, 50, "", day(12, 8)).unwrap();
        // Outside the 30-day window
        store.add_donation_at("D", "", water, 99, "", day(1, 8) - Duration::days(60)).unwrap();

        let aggregator = StatsAggregator::new(store, 5);
        let trends = aggregator.donation_trends(day(20, 12)).await;

        assert_eq!(trends.total_days, 2);
        assert_eq!(trends.total_quantity_period, 100);
        assert_eq!(trends.daily[0].day, day(10, 0).date_naive());
        assert_eq!(trends.daily[0].donation_count, 2);
        assert_eq!(trends.daily[0].total_quantity, 50);
        assert_eq!(trends.daily[1].donation_count, 1);
        assert!((trends.average_daily_donations - 2.0 / 30.0).abs() < 1e-9);
    }

    // =========================================================================
    // Fail-open behavior
    // =========================================================================

    struct UnavailableStore;

    #[async_trait]
    impl InventoryStore for UnavailableStore {
        async fn list_resources(&self) -> crate::error::Result<Vec<ResourceRecord>> {
            Err(Error::StoreUnavailable("inventory offline".into()))
        }
        async fn list_resource_types(&self) -> crate::error::Result<Vec<ResourceType>> {
            Err(Error::StoreUnavailable("inventory offline".into()))
        }
        async fn list_camps(&self) -> crate::error::Result<Vec<Camp>> {
            Err(Error::StoreUnavailable("inventory offline".into()))
        }
        async fn set_quantities(
            &self,
            _resource_id: ResourceId,
            _available: u64,
            _needed: u64,
        ) -> crate::error::Result<()> {
            Err(Error::StoreUnavailable("inventory offline".into()))
        }
        async fn increment_available(
            &self,
            _camp_id: CampId,
            _resource_type_id: ResourceTypeId,
            _delta: u64,
        ) -> crate::error::Result<()> {
            Err(Error::StoreUnavailable("inventory offline".into()))
        }
    }

    #[async_trait]
    impl DonationLedger for UnavailableStore {
        async fn list_donations(&self) -> crate::error::Result<Vec<Donation>> {
            Err(Error::StoreUnavailable("ledger offline".into()))
        }
        async fn list_allocations(&self) -> crate::error::Result<Vec<Allocation>> {
            Err(Error::StoreUnavailable("ledger offline".into()))
        }
        async fn allocations_for(
            &self,
            _donation_id: DonationId,
        ) -> crate::error::Result<Vec<Allocation>> {
            Err(Error::StoreUnavailable("ledger offline".into()))
        }
        async fn get_donation(
            &self,
            _donation_id: DonationId,
        ) -> crate::error::Result<Option<Donation>> {
            Err(Error::StoreUnavailable("ledger offline".into()))
        }
        async fn set_donation_status(
            &self,
            _donation_id: DonationId,
            _status: DonationStatus,
        ) -> crate::error::Result<()> {
            Err(Error::StoreUnavailable("ledger offline".into()))
        }
    }

    #[tokio::test]
    async fn test_statistics_fail_open_on_unavailable_store() {
        // Degradation is logged, not raised; capture it like a deployment would.
        let _ = tracing_subscriber::fmt()
            .with_env_filter("relief_engine=error")
            .try_init();

        let aggregator = StatsAggregator::new(Arc::new(UnavailableStore), 5);

        let resources = aggregator.resource_statistics().await;
        assert_eq!(resources.total_shortages, 0);
        assert!(resources.top_shortages.is_empty());

        let donations = aggregator.donation_statistics().await;
        assert_eq!(donations.total_donations, 0);
        assert!(donations.top_donors.is_empty());

        assert!(aggregator.allocation_summary().await.is_empty());

        let trends = aggregator
            .donation_trends(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
            .await;
        assert_eq!(trends.total_days, 0);
    }
}
