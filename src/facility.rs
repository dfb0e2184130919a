//! Code for reading the hospital network definition and per-facility inventories.
use crate::id::{define_id_getter, define_id_type};
use crate::input::{read_csv_id_file, read_vec_from_csv};
use crate::resources::StaffRole;
use crate::supply::{ItemID, SupplyCatalog};
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::path::Path;

const FACILITIES_FILE_NAME: &str = "facilities.csv";
const INVENTORY_FILE_NAME: &str = "inventory.csv";
const STAFF_FILE_NAME: &str = "staff.csv";

define_id_type! {FacilityID}

/// The ownership class of a facility, which determines its safety buffer
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum FacilityClass {
    /// A municipal (public) hospital
    #[string = "municipal"]
    Municipal,
    /// A private hospital
    #[string = "private"]
    Private,
}

fn default_baseline_admissions() -> u32 {
    150
}

/// Read the baseline admission count, treating an empty field as absent
fn deserialise_baseline<'de, D>(deserialiser: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<u32> = serde::Deserialize::deserialize(deserialiser)?;
    Ok(value.unwrap_or_else(default_baseline_admissions))
}

/// A hospital in the forecast network
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Facility {
    /// Unique identifier for the facility (e.g. "KEM_H1")
    pub id: FacilityID,
    /// Human-readable name
    pub name: String,
    /// Ownership class
    pub class: FacilityClass,
    /// Typical daily admissions under normal conditions
    #[serde(
        default = "default_baseline_admissions",
        deserialize_with = "deserialise_baseline"
    )]
    pub baseline_admissions: u32,
}
define_id_getter! {Facility, FacilityID}

/// The hospital network, keyed by facility ID. Iteration follows file order.
pub type FacilityMap = IndexMap<FacilityID, Facility>;

/// A stock level record in `inventory.csv`
#[derive(Debug, Clone, Deserialize)]
struct StockRecord {
    facility_id: FacilityID,
    item_id: ItemID,
    stock: u64,
}

/// A staffing record in `staff.csv`
#[derive(Debug, Clone, Deserialize)]
struct StaffRecord {
    facility_id: FacilityID,
    role: StaffRole,
    count: u32,
}

/// Current stock and staffing at one facility.
///
/// Items and roles absent from the input files count as zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FacilityInventory {
    /// Units on hand per supply item
    pub stock: IndexMap<ItemID, u64>,
    /// Headcount per staff role
    pub staff: IndexMap<StaffRole, u32>,
}

impl FacilityInventory {
    /// Units of `item` on hand
    pub fn stock_of(&self, item: &ItemID) -> u64 {
        self.stock.get(item).copied().unwrap_or(0)
    }

    /// Headcount for `role`
    pub fn staff_of(&self, role: StaffRole) -> u32 {
        self.staff.get(&role).copied().unwrap_or(0)
    }
}

/// Per-facility inventories, with an entry for every facility in the network
pub type InventoryMap = IndexMap<FacilityID, FacilityInventory>;

/// Read the hospital network definition from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_facilities(model_dir: &Path) -> Result<FacilityMap> {
    read_csv_id_file(&model_dir.join(FACILITIES_FILE_NAME))
}

/// Read stock and staffing levels for every facility in the network.
///
/// Both files are long format with one row per facility/item (or facility/role) pair. Every
/// facility gets an inventory entry even if it appears in neither file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `facilities` - The hospital network, used to check facility IDs
/// * `catalog` - The supply catalog, used to check item IDs
pub fn read_inventory(
    model_dir: &Path,
    facilities: &FacilityMap,
    catalog: &SupplyCatalog,
) -> Result<InventoryMap> {
    let mut inventory: InventoryMap = facilities
        .keys()
        .map(|id| (id.clone(), FacilityInventory::default()))
        .collect();

    for record in read_vec_from_csv::<StockRecord>(&model_dir.join(INVENTORY_FILE_NAME))? {
        ensure!(
            catalog.contains_key(&record.item_id),
            "Unknown item ID {} in {INVENTORY_FILE_NAME}",
            record.item_id
        );
        let entry = inventory
            .get_mut(&record.facility_id)
            .ok_or_else(|| anyhow::anyhow!(
                "Unknown facility ID {} in {INVENTORY_FILE_NAME}",
                record.facility_id
            ))?;
        ensure!(
            entry.stock.insert(record.item_id.clone(), record.stock).is_none(),
            "Duplicate stock entry for {}/{} in {INVENTORY_FILE_NAME}",
            record.facility_id,
            record.item_id
        );
    }

    for record in read_vec_from_csv::<StaffRecord>(&model_dir.join(STAFF_FILE_NAME))? {
        let entry = inventory
            .get_mut(&record.facility_id)
            .ok_or_else(|| anyhow::anyhow!(
                "Unknown facility ID {} in {STAFF_FILE_NAME}",
                record.facility_id
            ))?;
        ensure!(
            entry.staff.insert(record.role, record.count).is_none(),
            "Duplicate staff entry for {} in {STAFF_FILE_NAME}",
            record.facility_id
        );
    }

    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::oxygen_cylinders;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_model_files(dir: &Path) {
        let mut file = File::create(dir.join(FACILITIES_FILE_NAME)).unwrap();
        writeln!(
            file,
            "id,name,class,baseline_admissions\nKEM_H1,KEM Hospital,municipal,200\nLIL_H7,Lilavati Hospital,private,"
        )
        .unwrap();

        let mut file = File::create(dir.join(INVENTORY_FILE_NAME)).unwrap();
        writeln!(
            file,
            "facility_id,item_id,stock\nKEM_H1,oxygen_cylinders,400\nLIL_H7,oxygen_cylinders,120"
        )
        .unwrap();

        let mut file = File::create(dir.join(STAFF_FILE_NAME)).unwrap();
        writeln!(
            file,
            "facility_id,role,count\nKEM_H1,doctors,40\nKEM_H1,nurses,110\nLIL_H7,doctors,25"
        )
        .unwrap();
    }

    #[test]
    fn test_read_facilities() {
        let dir = tempdir().unwrap();
        write_model_files(dir.path());

        let facilities = read_facilities(dir.path()).unwrap();
        assert_eq!(facilities.len(), 2);
        assert_eq!(facilities["KEM_H1"].class, FacilityClass::Municipal);
        assert_eq!(facilities["KEM_H1"].baseline_admissions, 200);
        // Missing value takes the default
        assert_eq!(facilities["LIL_H7"].baseline_admissions, 150);
    }

    #[test]
    fn test_read_inventory() {
        let dir = tempdir().unwrap();
        write_model_files(dir.path());

        let facilities = read_facilities(dir.path()).unwrap();
        let catalog: SupplyCatalog = [("oxygen_cylinders".into(), oxygen_cylinders())]
            .into_iter()
            .collect();
        let inventory = read_inventory(dir.path(), &facilities, &catalog).unwrap();

        let kem = &inventory["KEM_H1"];
        assert_eq!(kem.stock_of(&"oxygen_cylinders".into()), 400);
        assert_eq!(kem.staff_of(StaffRole::Nurses), 110);
        // Unlisted roles count as zero
        assert_eq!(inventory["LIL_H7"].staff_of(StaffRole::Nurses), 0);
    }

    #[test]
    fn test_read_inventory_rejects_unknown_facility() {
        let dir = tempdir().unwrap();
        write_model_files(dir.path());
        {
            let mut file = File::create(dir.path().join(INVENTORY_FILE_NAME)).unwrap();
            writeln!(
                file,
                "facility_id,item_id,stock\nHBT_H15,oxygen_cylinders,50"
            )
            .unwrap();
        }

        let facilities = read_facilities(dir.path()).unwrap();
        let catalog: SupplyCatalog = [("oxygen_cylinders".into(), oxygen_cylinders())]
            .into_iter()
            .collect();
        assert!(read_inventory(dir.path(), &facilities, &catalog).is_err());
    }
}
