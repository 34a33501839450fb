//! Relief Engine Facade
//!
//! Wires the shortage calculator, the allocation engine, and the statistics
//! aggregator over one injected store, exposing the surface the external
//! CRUD/web layer calls into. The facade adds no decision logic of its own.

use crate::allocation::{AutoAllocateReport, DonationAllocator};
use crate::domain::ports::{DonationLedgerRef, ReliefStore};
use crate::domain::{
    summarize_donations, Allocation, CampId, DonationId, DonationStatus, DonationSummary,
};
use crate::error::Result;
use crate::shortage::{ShortageCalculator, ShortageView};
use crate::stats::{
    AllocationSummaryRow, DonationStatistics, DonationTrends, ResourceStatistics, StatsAggregator,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// =============================================================================
// Engine Configuration
// =============================================================================

/// Configuration for the relief engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Commit retries after a lost race in the allocation primitive
    pub conflict_retry_limit: u32,
    /// Row limit for top-shortage views in statistics
    pub top_shortage_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            conflict_retry_limit: 1,
            top_shortage_limit: 5,
        }
    }
}

// =============================================================================
// Engine Status
// =============================================================================

/// Point-in-time summary of the engine's working set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub shortages: usize,
    pub critical_shortages: usize,
    pub pending_donations: usize,
}

// =============================================================================
// Relief Engine
// =============================================================================

/// Facade over the three engine components
pub struct ReliefEngine {
    calculator: ShortageCalculator,
    allocator: Arc<DonationAllocator>,
    aggregator: StatsAggregator,
    ledger: DonationLedgerRef,
    config: EngineConfig,
}

impl ReliefEngine {
    /// Create an engine over a store
    pub fn new<S: ReliefStore + 'static>(config: EngineConfig, store: Arc<S>) -> Arc<Self> {
        info!(
            "Initializing relief engine (conflict retries: {}, top shortages: {})",
            config.conflict_retry_limit, config.top_shortage_limit
        );
        Arc::new(Self {
            calculator: ShortageCalculator::new(store.clone()),
            allocator: DonationAllocator::new(store.clone(), config.conflict_retry_limit),
            aggregator: StatsAggregator::new(store.clone(), config.top_shortage_limit),
            ledger: store,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // Shortages
    // =========================================================================

    /// Every under-supplied (camp, resource type) pair
    pub async fn compute_shortages(&self) -> Result<Vec<ShortageView>> {
        self.calculator.compute_shortages().await
    }

    /// Shortages classified High or Critical
    pub async fn critical_shortages(&self) -> Result<Vec<ShortageView>> {
        self.calculator.critical_shortages().await
    }

    /// The `n` largest shortages, deterministically ordered
    pub async fn top_shortages(&self, n: usize) -> Result<Vec<ShortageView>> {
        self.calculator.top_shortages(n).await
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Allocate part of a donation to one camp (the engine running with a
    /// single candidate)
    pub async fn allocate_donation_to_camp(
        &self,
        donation_id: DonationId,
        camp_id: CampId,
        quantity: u64,
    ) -> Result<Allocation> {
        self.allocator
            .allocate_to_camp(donation_id, camp_id, quantity)
            .await
    }

    /// Greedily match all pending donations against current shortages
    pub async fn auto_allocate(&self) -> Result<AutoAllocateReport> {
        self.allocator.auto_allocate().await
    }

    // =========================================================================
    // Ledger views
    // =========================================================================

    /// All donations with derived allocation totals, in ledger order
    pub async fn donation_summaries(&self) -> Result<Vec<DonationSummary>> {
        let (donations, allocations) = futures::try_join!(
            self.ledger.list_donations(),
            self.ledger.list_allocations()
        )?;
        Ok(summarize_donations(&donations, &allocations))
    }

    /// Pending donations that still have quantity left to allocate
    pub async fn pending_donations(&self) -> Result<Vec<DonationSummary>> {
        let summaries = self.donation_summaries().await?;
        Ok(summaries
            .into_iter()
            .filter(|s| s.donation.status == DonationStatus::Pending && s.remaining_quantity > 0)
            .collect())
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    pub async fn resource_statistics(&self) -> ResourceStatistics {
        self.aggregator.resource_statistics().await
    }

    pub async fn donation_statistics(&self) -> DonationStatistics {
        self.aggregator.donation_statistics().await
    }

    pub async fn allocation_summary(&self) -> Vec<AllocationSummaryRow> {
        self.aggregator.allocation_summary().await
    }

    pub async fn donation_trends(&self, now: DateTime<Utc>) -> DonationTrends {
        self.aggregator.donation_trends(now).await
    }

    /// Point-in-time working-set summary
    pub async fn status(&self) -> Result<EngineStatus> {
        let shortages = self.compute_shortages().await?;
        let critical_shortages = shortages
            .iter()
            .filter(|s| s.severity != crate::shortage::Severity::Normal)
            .count();
        let pending = self.pending_donations().await?;
        Ok(EngineStatus {
            shortages: shortages.len(),
            critical_shortages,
            pending_donations: pending.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn seeded() -> (Arc<MemoryStore>, Arc<ReliefEngine>) {
        let store = Arc::new(MemoryStore::new());
        let disaster = store.add_disaster("Flood 2024", "flood", "Riverside", "Severe");
        let camp_a = store.add_camp(disaster, "Camp Alpha", "North bank", 500);
        let camp_b = store.add_camp(disaster, "Camp Bravo", "South bank", 300);
        let water = store.add_resource_type("Water", "litres");
        store.upsert_resource(camp_a, water, 20, 100).unwrap();
        store.upsert_resource(camp_b, water, 80, 100).unwrap();
        store.add_donation("Aid Org", "", water, 50, "").unwrap();

        let engine = ReliefEngine::new(EngineConfig::default(), store.clone());
        (store, engine)
    }

    #[tokio::test]
    async fn test_facade_wires_all_components() {
        let (_store, engine) = seeded();

        assert_eq!(engine.compute_shortages().await.unwrap().len(), 2);
        assert_eq!(engine.pending_donations().await.unwrap().len(), 1);

        let report = engine.auto_allocate().await.unwrap();
        assert_eq!(report.allocations_made, 1);

        let stats = engine.resource_statistics().await;
        assert_eq!(stats.total_shortages, 2);
        assert_eq!(engine.pending_donations().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_status_reflects_working_set() {
        let (_store, engine) = seeded();
        let status = engine.status().await.unwrap();
        assert_eq!(status.shortages, 2);
        assert_eq!(status.critical_shortages, 1);
        assert_eq!(status.pending_donations, 1);
    }

    #[tokio::test]
    async fn test_reports_serialize_for_the_web_layer() {
        let (_store, engine) = seeded();
        engine.auto_allocate().await.unwrap();

        let stats = engine.donation_statistics().await;
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_donations"], 1);
        assert_eq!(json["allocated_donations"], 1);

        let shortages = engine.compute_shortages().await.unwrap();
        let json = serde_json::to_value(&shortages).unwrap();
        assert!(json.as_array().is_some());
    }

    #[tokio::test]
    async fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.conflict_retry_limit, 1);
        assert_eq!(config.top_shortage_limit, 5);
    }
}
