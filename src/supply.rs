//! Code for the medical supply catalog.
//!
//! Each catalog item carries the per-admission consumption rate for every disease category,
//! along with its procurement lead time, clinical criticality weight and unit cost. The
//! facility-level procurement planner is driven entirely by this table.
use crate::admissions::AdmissionBreakdown;
use crate::id::{define_id_getter, define_id_type};
use crate::input::read_csv_id_file;
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const SUPPLY_CATALOG_FILE_NAME: &str = "supply_catalog.csv";

define_id_type! {ItemID}

/// Criticality weight for items not otherwise classified
fn default_criticality() -> f64 {
    0.5
}

/// A supply item in the procurement catalog
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SupplyItem {
    /// Unique identifier for the item (e.g. "oxygen_cylinders")
    pub id: ItemID,
    /// Units consumed per respiratory admission
    pub respiratory: f64,
    /// Units consumed per waterborne admission
    pub waterborne: f64,
    /// Units consumed per heat-related admission
    pub heat_related: f64,
    /// Units consumed per trauma admission
    pub trauma: f64,
    /// Units consumed per other admission
    pub other: f64,
    /// Days between placing an order and delivery
    pub lead_time_days: u32,
    /// Clinical criticality weight in [0, 1]
    #[serde(default = "default_criticality")]
    pub criticality: f64,
    /// Cost per unit, used by the budget-aware planner
    #[serde(default)]
    pub unit_cost: f64,
}
define_id_getter! {SupplyItem, ItemID}

impl SupplyItem {
    /// Units of this item needed for the given admissions, before any safety buffer
    pub fn base_need(&self, admissions: &AdmissionBreakdown) -> f64 {
        let rates = [
            self.respiratory,
            self.waterborne,
            self.heat_related,
            self.trauma,
            self.other,
        ];

        admissions
            .categories()
            .iter()
            .zip(rates)
            .map(|(count, rate)| f64::from(*count) * rate)
            .sum()
    }
}

/// The supply catalog, keyed by item ID. Iteration follows catalog file order.
pub type SupplyCatalog = IndexMap<ItemID, SupplyItem>;

/// Read the supply catalog from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_supply_catalog(model_dir: &Path) -> Result<SupplyCatalog> {
    let catalog: SupplyCatalog =
        read_csv_id_file(&model_dir.join(SUPPLY_CATALOG_FILE_NAME))?;

    for item in catalog.values() {
        let rates = [
            item.respiratory,
            item.waterborne,
            item.heat_related,
            item.trauma,
            item.other,
        ];
        ensure!(
            rates.iter().all(|rate| *rate >= 0.0),
            "Supply item {} has a negative consumption rate",
            item.id
        );
        ensure!(
            (0.0..=1.0).contains(&item.criticality),
            "Supply item {} has criticality outside [0, 1]",
            item.id
        );
        ensure!(
            item.unit_cost >= 0.0,
            "Supply item {} has a negative unit cost",
            item.id
        );
    }

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_approx, oxygen_cylinders};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_base_need() {
        let item = oxygen_cylinders();
        let admissions = AdmissionBreakdown {
            total: 100,
            respiratory: 30,
            waterborne: 10,
            heat_related: 5,
            trauma: 20,
            other: 35,
        };

        // 30*0.3 + 10*0.05 + 5*0.2 + 20*0.3 + 35*0.25
        assert_approx(item.base_need(&admissions), 25.25);
    }

    #[test]
    fn test_read_supply_catalog() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(SUPPLY_CATALOG_FILE_NAME)).unwrap();
            writeln!(
                file,
                "id,respiratory,waterborne,heat_related,trauma,other,lead_time_days,criticality,unit_cost
oxygen_cylinders,0.3,0.05,0.2,0.3,0.25,1,0.95,4500
gloves_ppe,25,20,12,30,15,2,0.85,40"
            )
            .unwrap();
        }

        let catalog = read_supply_catalog(dir.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        let item = &catalog["oxygen_cylinders"];
        assert_eq!(item.lead_time_days, 1);
        assert_approx(item.criticality, 0.95);
    }

    #[test]
    fn test_read_supply_catalog_rejects_negative_rate() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(SUPPLY_CATALOG_FILE_NAME)).unwrap();
            writeln!(
                file,
                "id,respiratory,waterborne,heat_related,trauma,other,lead_time_days,criticality,unit_cost
oxygen_cylinders,-0.3,0.05,0.2,0.3,0.25,1,0.95,4500"
            )
            .unwrap();
        }

        assert!(read_supply_catalog(dir.path()).is_err());
    }
}
