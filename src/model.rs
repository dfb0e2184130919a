//! The model representing the hospital network and forecast parameters.
//!
//! A model is a folder of configuration files: `model.toml` with the parameter tables plus
//! CSV files for the hospital network, supply catalog, inventories, festival calendar and
//! environmental observations. Loading is fail-fast: every table is validated before a
//! forecast can run.
use crate::admissions::AdmissionParameters;
use crate::calendar::{FestivalCalendar, read_festivals};
use crate::environment::{ObservationTable, read_observations};
use crate::facility::{FacilityMap, InventoryMap, read_facilities, read_inventory};
use crate::forecast::ForecastParameters;
use crate::procurement::ProcurementParameters;
use crate::resources::ResourceParameters;
use crate::supply::{SupplyCatalog, read_supply_catalog};
use crate::surge::SurgeParameters;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

/// The model file name, expected in the model directory
pub const MODEL_FILE_NAME: &str = "model.toml";

/// The parameter tables of `model.toml`. Every table and field is optional and defaults to
/// the standard Mumbai configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
struct ModelFile {
    #[serde(default)]
    surge: SurgeParameters,
    #[serde(default)]
    admissions: AdmissionParameters,
    #[serde(default)]
    resources: ResourceParameters,
    #[serde(default)]
    procurement: ProcurementParameters,
    #[serde(default)]
    forecast: ForecastParameters,
}

/// A fully loaded and validated forecast model
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Surge multiplier parameters
    pub surge: SurgeParameters,
    /// Admission decomposition parameters
    pub admissions: AdmissionParameters,
    /// Resource projection parameters
    pub resources: ResourceParameters,
    /// Procurement planner parameters
    pub procurement: ProcurementParameters,
    /// Forecast horizon parameters
    pub forecast: ForecastParameters,
    /// The supply catalog
    pub catalog: SupplyCatalog,
    /// The hospital network
    pub facilities: FacilityMap,
    /// Per-facility stock and staffing
    pub inventory: InventoryMap,
    /// The festival calendar
    pub calendar: FestivalCalendar,
    /// Environmental observations
    pub observations: ObservationTable,
}

impl Model {
    /// Load and validate a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        ensure!(
            model_dir.is_dir(),
            "Model directory {} does not exist",
            model_dir.display()
        );

        let file: ModelFile = crate::input::read_toml(&model_dir.join(MODEL_FILE_NAME))
            .with_context(|| format!("Could not load model from {}", model_dir.display()))?;
        file.surge.validate().context("Invalid surge parameters")?;
        file.admissions
            .validate()
            .context("Invalid admission parameters")?;
        file.resources
            .validate()
            .context("Invalid resource parameters")?;
        file.procurement
            .validate()
            .context("Invalid procurement parameters")?;
        file.forecast
            .validate()
            .context("Invalid forecast parameters")?;

        let catalog = read_supply_catalog(model_dir)?;
        let facilities = read_facilities(model_dir)?;
        let inventory = read_inventory(model_dir, &facilities, &catalog)?;
        let calendar = read_festivals(model_dir)?;
        let observations = read_observations(model_dir)?;

        Ok(Model {
            surge: file.surge,
            admissions: file.admissions,
            resources: file.resources,
            procurement: file.procurement,
            forecast: file.forecast,
            catalog,
            facilities,
            inventory,
            calendar,
            observations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_model(dir: &Path) {
        let mut file = File::create(dir.join(MODEL_FILE_NAME)).unwrap();
        writeln!(file, "[surge]\nwinter_weight = 0.2\n\n[forecast]\nhorizon_days = 10").unwrap();

        let mut file = File::create(dir.join("supply_catalog.csv")).unwrap();
        writeln!(
            file,
            "id,respiratory,waterborne,heat_related,trauma,other,lead_time_days,criticality,unit_cost\noxygen_cylinders,0.3,0.05,0.2,0.3,0.25,1,0.95,4500"
        )
        .unwrap();

        let mut file = File::create(dir.join("facilities.csv")).unwrap();
        writeln!(file, "id,name,class,baseline_admissions\nKEM_H1,KEM Hospital,municipal,200").unwrap();

        let mut file = File::create(dir.join("inventory.csv")).unwrap();
        writeln!(file, "facility_id,item_id,stock\nKEM_H1,oxygen_cylinders,400").unwrap();

        let mut file = File::create(dir.join("staff.csv")).unwrap();
        writeln!(file, "facility_id,role,count\nKEM_H1,doctors,40").unwrap();
    }

    #[test]
    fn test_from_path() {
        let dir = tempdir().unwrap();
        write_model(dir.path());

        let model = Model::from_path(dir.path()).unwrap();
        assert_eq!(model.surge.winter_weight, 0.2);
        assert_eq!(model.forecast.horizon_days, 10);
        assert_eq!(model.facilities.len(), 1);
        // Optional files default to empty
        assert_eq!(model.calendar, FestivalCalendar::empty());
    }

    #[test]
    fn test_from_path_missing_directory() {
        let dir = tempdir().unwrap();
        assert!(Model::from_path(dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_from_path_rejects_invalid_parameters() {
        let dir = tempdir().unwrap();
        write_model(dir.path());
        {
            let mut file = File::create(dir.path().join(MODEL_FILE_NAME)).unwrap();
            writeln!(file, "[surge]\nwinter_weight = -1.0").unwrap();
        }

        assert!(Model::from_path(dir.path()).is_err());
    }
}
