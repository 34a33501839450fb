//! Shortage Calculator
//!
//! Derives shortage views from inventory snapshots. No side effects; every
//! call re-reads the store so views are always fresh relative to prior
//! allocations.

use crate::domain::ports::InventoryStoreRef;
use crate::domain::{CampId, ResourceId, ResourceRecord, ResourceTypeId};
use crate::error::Result;
use crate::shortage::severity::{classify_severity, shortage_ratio, Severity, ShortageRatio};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

// =============================================================================
// Shortage View
// =============================================================================

/// One under-supplied (camp, resource type) pair, with joined metadata and
/// severity attached. Derived, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortageView {
    pub resource_id: ResourceId,
    pub camp_id: CampId,
    pub camp_name: String,
    pub disaster_name: String,
    pub resource_type_id: ResourceTypeId,
    pub type_name: String,
    pub unit: String,
    pub quantity_available: u64,
    pub quantity_needed: u64,
    /// `quantity_needed - quantity_available`, always > 0
    pub shortage_amount: u64,
    pub ratio: ShortageRatio,
    pub severity: Severity,
}

impl ShortageView {
    fn from_record(record: &ResourceRecord) -> Option<Self> {
        let resource = &record.resource;
        if resource.quantity_needed <= resource.quantity_available {
            return None;
        }

        Some(Self {
            resource_id: resource.id,
            camp_id: resource.camp_id,
            camp_name: record.camp_name.clone(),
            disaster_name: record.disaster_name.clone(),
            resource_type_id: resource.resource_type_id,
            type_name: record.type_name.clone(),
            unit: record.unit.clone(),
            quantity_available: resource.quantity_available,
            quantity_needed: resource.quantity_needed,
            shortage_amount: resource.quantity_needed - resource.quantity_available,
            ratio: shortage_ratio(resource.quantity_available, resource.quantity_needed),
            severity: classify_severity(resource.quantity_available, resource.quantity_needed),
        })
    }
}

/// Sort shortages by amount descending, camp id ascending on ties.
/// This is the deterministic order used for top-N views and for the
/// allocation engine's per-donation walk.
pub(crate) fn sort_by_need(shortages: &mut [ShortageView]) {
    shortages.sort_by_key(|s| (Reverse(s.shortage_amount), s.camp_id));
}

// =============================================================================
// Shortage Calculator
// =============================================================================

/// Read-side calculator over an inventory store
pub struct ShortageCalculator {
    inventory: InventoryStoreRef,
}

impl ShortageCalculator {
    pub fn new(inventory: InventoryStoreRef) -> Self {
        Self { inventory }
    }

    /// Every inventory row where needed exceeds available, in store order.
    /// Callers sort as needed.
    pub async fn compute_shortages(&self) -> Result<Vec<ShortageView>> {
        let records = self.inventory.list_resources().await?;
        Ok(records.iter().filter_map(ShortageView::from_record).collect())
    }

    /// Shortages classified High or Critical
    pub async fn critical_shortages(&self) -> Result<Vec<ShortageView>> {
        let shortages = self.compute_shortages().await?;
        Ok(shortages
            .into_iter()
            .filter(|s| s.severity != Severity::Normal)
            .collect())
    }

    /// The `n` largest shortages by amount, ties broken by camp id ascending
    pub async fn top_shortages(&self, n: usize) -> Result<Vec<ShortageView>> {
        let mut shortages = self.compute_shortages().await?;
        sort_by_need(&mut shortages);
        shortages.truncate(n);
        Ok(shortages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use std::sync::Arc;

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let disaster = store.add_disaster("Flood 2024", "flood", "Riverside", "Severe");
        let camp_a = store.add_camp(disaster, "Camp Alpha", "North bank", 500);
        let camp_b = store.add_camp(disaster, "Camp Bravo", "South bank", 300);
        let water = store.add_resource_type("Water", "litres");
        let tents = store.add_resource_type("Tents", "units");

        // Alpha: short 80 litres of water, Critical (100 > 2 * 20)
        store.upsert_resource(camp_a, water, 20, 100).unwrap();
        // Bravo: short 20 litres, Normal (100 <= 1.5 * 80)
        store.upsert_resource(camp_b, water, 80, 100).unwrap();
        // Alpha: tents fully stocked, no shortage
        store.upsert_resource(camp_a, tents, 50, 50).unwrap();
        store
    }

    #[tokio::test]
    async fn test_compute_shortages_filters_satisfied_rows() {
        let store = seeded_store();
        let calc = ShortageCalculator::new(store);

        let shortages = calc.compute_shortages().await.unwrap();
        assert_eq!(shortages.len(), 2);
        assert!(shortages.iter().all(|s| s.shortage_amount > 0));
        assert!(shortages.iter().all(|s| s.type_name == "Water"));
    }

    #[tokio::test]
    async fn test_views_carry_joined_metadata() {
        let store = seeded_store();
        let calc = ShortageCalculator::new(store);

        let shortages = calc.compute_shortages().await.unwrap();
        let alpha = shortages
            .iter()
            .find(|s| s.camp_name == "Camp Alpha")
            .unwrap();
        assert_eq!(alpha.disaster_name, "Flood 2024");
        assert_eq!(alpha.unit, "litres");
        assert_eq!(alpha.shortage_amount, 80);
        assert_eq!(alpha.severity, Severity::Critical);
    }

    #[tokio::test]
    async fn test_critical_includes_high_and_critical() {
        let store = Arc::new(MemoryStore::new());
        let disaster = store.add_disaster("Quake", "earthquake", "Hills", "Moderate");
        let camp_a = store.add_camp(disaster, "Camp Alpha", "Ridge", 200);
        let camp_b = store.add_camp(disaster, "Camp Bravo", "Valley", 200);
        let camp_c = store.add_camp(disaster, "Camp Charlie", "Plain", 200);
        let water = store.add_resource_type("Water", "litres");
        // Critical: 100 > 2 * 20
        store.upsert_resource(camp_a, water, 20, 100).unwrap();
        // Normal shortage: 100 <= 1.5 * 80
        store.upsert_resource(camp_b, water, 80, 100).unwrap();
        // High: 160 > 1.5 * 100, not > 2 * 100
        store.upsert_resource(camp_c, water, 100, 160).unwrap();

        let calc = ShortageCalculator::new(store);
        let critical = calc.critical_shortages().await.unwrap();
        let severities: Vec<Severity> = critical.iter().map(|s| s.severity).collect();
        assert!(severities.contains(&Severity::Critical));
        assert!(severities.contains(&Severity::High));
        assert!(!severities.contains(&Severity::Normal));
    }

    #[tokio::test]
    async fn test_top_shortages_orders_and_truncates() {
        let store = seeded_store();
        let calc = ShortageCalculator::new(store);

        let top = calc.top_shortages(1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].camp_name, "Camp Alpha");
        assert_eq!(top[0].shortage_amount, 80);
    }

    #[tokio::test]
    async fn test_tie_broken_by_camp_id() {
        let store = Arc::new(MemoryStore::new());
        let disaster = store.add_disaster("Storm", "cyclone", "Coast", "Severe");
        let camp_1 = store.add_camp(disaster, "First", "A", 100);
        let camp_2 = store.add_camp(disaster, "Second", "B", 100);
        let blankets = store.add_resource_type("Blankets", "units");
        // Same shortage amount in both camps
        store.upsert_resource(camp_2, blankets, 10, 40).unwrap();
        store.upsert_resource(camp_1, blankets, 20, 50).unwrap();

        let calc = ShortageCalculator::new(store);
        let top = calc.top_shortages(2).await.unwrap();
        assert_eq!(top[0].camp_id, camp_1);
        assert_eq!(top[1].camp_id, camp_2);
    }
}
