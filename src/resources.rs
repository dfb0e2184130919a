//! The resource requirement projector.
//!
//! Converts an admission breakdown into staff counts, bulk supply quantities and bed counts
//! using fixed, injected ratios. Used for aggregate forecasting and staffing; facility-level
//! per-item supply planning uses the catalog rates in [`crate::supply`] instead.
use crate::admissions::AdmissionBreakdown;
use crate::supply::ItemID;
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// A staff role tracked by the staffing planner
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum StaffRole {
    /// Doctors
    #[string = "doctors"]
    Doctors,
    /// Nurses
    #[string = "nurses"]
    Nurses,
    /// Support staff
    #[string = "support_staff"]
    SupportStaff,
}

fn default_patients_per_doctor() -> f64 {
    15.0
}

fn default_patients_per_nurse() -> f64 {
    5.0
}

fn default_patients_per_support() -> f64 {
    10.0
}

fn default_bed_occupancy_target() -> f64 {
    0.7
}

fn default_supplies_per_patient() -> IndexMap<ItemID, f64> {
    [
        ("ppe_kits", 2.0),
        ("oxygen_liters", 10.0),
        ("iv_fluids_ml", 500.0),
        ("medications_units", 5.0),
        ("bed_linens", 2.0),
    ]
    .into_iter()
    .map(|(id, rate)| (id.into(), rate))
    .collect()
}

/// Configuration for the resource requirement projection
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResourceParameters {
    /// Patients covered by one doctor
    #[serde(default = "default_patients_per_doctor")]
    pub patients_per_doctor: f64,
    /// Patients covered by one nurse
    #[serde(default = "default_patients_per_nurse")]
    pub patients_per_nurse: f64,
    /// Patients covered by one support staff member
    #[serde(default = "default_patients_per_support")]
    pub patients_per_support: f64,
    /// Target bed occupancy ratio used to size bed requirements
    #[serde(default = "default_bed_occupancy_target")]
    pub bed_occupancy_target: f64,
    /// Bulk supply consumption per admitted patient
    #[serde(default = "default_supplies_per_patient")]
    pub supplies_per_patient: IndexMap<ItemID, f64>,
}

impl Default for ResourceParameters {
    fn default() -> Self {
        toml::from_str("").expect("Cannot create resource parameters from empty TOML")
    }
}

impl ResourceParameters {
    /// Check the ratios are usable
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.patients_per_doctor > 0.0
                && self.patients_per_nurse > 0.0
                && self.patients_per_support > 0.0,
            "Staff ratios must be positive"
        );
        ensure!(
            self.bed_occupancy_target > 0.0 && self.bed_occupancy_target <= 1.0,
            "Bed occupancy target must be in (0, 1]"
        );
        ensure!(
            self.supplies_per_patient.values().all(|rate| *rate >= 0.0),
            "Per-patient supply rates must be non-negative"
        );

        Ok(())
    }
}

/// Projected staff, supply and bed requirements for an admission forecast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceForecast {
    /// Doctors needed
    pub doctors_needed: u32,
    /// Nurses needed
    pub nurses_needed: u32,
    /// Support staff needed
    pub support_staff_needed: u32,
    /// Bulk supply quantities needed, keyed by item
    pub supplies: IndexMap<ItemID, u64>,
    /// Beds needed at the target occupancy
    pub beds_needed: u32,
}

impl ResourceForecast {
    /// The staff requirements as a role-keyed map
    pub fn required_staff(&self) -> IndexMap<StaffRole, u32> {
        [
            (StaffRole::Doctors, self.doctors_needed),
            (StaffRole::Nurses, self.nurses_needed),
            (StaffRole::SupportStaff, self.support_staff_needed),
        ]
        .into_iter()
        .collect()
    }
}

/// Project the resource requirements for an admission breakdown.
///
/// A pure function of the breakdown and the injected ratios; always returns non-negative
/// integer quantities (staff counts round up).
pub fn project(params: &ResourceParameters, admissions: &AdmissionBreakdown) -> ResourceForecast {
    let total = f64::from(admissions.total);

    let supplies = params
        .supplies_per_patient
        .iter()
        .map(|(id, rate)| (id.clone(), (total * rate) as u64))
        .collect();

    ResourceForecast {
        doctors_needed: (total / params.patients_per_doctor).ceil() as u32,
        nurses_needed: (total / params.patients_per_nurse).ceil() as u32,
        support_staff_needed: (total / params.patients_per_support).ceil() as u32,
        supplies,
        beds_needed: (total / params.bed_occupancy_target).ceil() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::breakdown;

    #[test]
    fn test_project() {
        let params = ResourceParameters::default();
        let forecast = project(&params, &breakdown(150));

        assert_eq!(forecast.doctors_needed, 10);
        assert_eq!(forecast.nurses_needed, 30);
        assert_eq!(forecast.support_staff_needed, 15);
        assert_eq!(forecast.beds_needed, 215);
        assert_eq!(forecast.supplies["ppe_kits"], 300);
        assert_eq!(forecast.supplies["oxygen_liters"], 1500);
        assert_eq!(forecast.supplies["iv_fluids_ml"], 75_000);
        assert_eq!(forecast.supplies["medications_units"], 750);
        assert_eq!(forecast.supplies["bed_linens"], 300);
    }

    #[test]
    fn test_project_rounds_staff_up() {
        let params = ResourceParameters::default();
        let forecast = project(&params, &breakdown(16));
        assert_eq!(forecast.doctors_needed, 2);
        assert_eq!(forecast.nurses_needed, 4);
    }

    #[test]
    fn test_project_zero_admissions() {
        let params = ResourceParameters::default();
        let forecast = project(&params, &breakdown(0));
        assert_eq!(forecast.doctors_needed, 0);
        assert_eq!(forecast.beds_needed, 0);
        assert!(forecast.supplies.values().all(|quantity| *quantity == 0));
    }

    #[test]
    fn test_validate_rejects_zero_ratio() {
        let mut params = ResourceParameters::default();
        params.patients_per_nurse = 0.0;
        assert!(params.validate().is_err());
    }
}
