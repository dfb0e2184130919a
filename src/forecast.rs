//! The forecast runner.
//!
//! Walks the forecast horizon day by day, assesses surge risk for each date, picks the peak
//! day and builds a full preparation plan for every facility plus a pooled view of the whole
//! network.
use crate::admissions::{AdmissionBreakdown, decompose};
use crate::environment::normalise;
use crate::facility::{FacilityClass, FacilityID};
use crate::model::Model;
use crate::narrative::NarrativeGenerator;
use crate::pooling::{self, FacilityResourceSummary, NetworkPlan};
use crate::procurement::{
    self, BudgetOutcome, PlannerMode, ProcurementItem, StaffAllocation,
};
use crate::resources::{self, ResourceForecast};
use crate::surge::{self, SurgeAssessment};
use crate::timeline::{self, TimelineEntry};
use anyhow::{Result, ensure};
use chrono::{Days, NaiveDate};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

fn default_horizon_days() -> u32 {
    7
}

/// Longest supported forecast horizon
const MAX_HORIZON_DAYS: u32 = 30;

/// Configuration for the forecast horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ForecastParameters {
    /// Number of days to forecast, starting from the run date
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
}

impl Default for ForecastParameters {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
        }
    }
}

impl ForecastParameters {
    /// Check the horizon is usable
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (1..=MAX_HORIZON_DAYS).contains(&self.horizon_days),
            "Forecast horizon must be between 1 and {MAX_HORIZON_DAYS} days"
        );

        Ok(())
    }
}

/// The complete preparation plan for one facility at the surge peak
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityPlan {
    /// The facility
    pub facility_id: FacilityID,
    /// Human-readable facility name
    pub name: String,
    /// Ownership class
    pub class: FacilityClass,
    /// Predicted admissions on the peak day
    pub predicted_admissions: u32,
    /// Predicted admissions split into disease categories
    pub admissions: AdmissionBreakdown,
    /// Staff, bulk supply and bed requirements
    pub resources: ResourceForecast,
    /// Per-item procurement plan, sorted by descending priority
    pub procurement: Vec<ProcurementItem>,
    /// Budget outcome, present in budget-aware mode
    pub budget: Option<BudgetOutcome>,
    /// Staffing plan per role
    pub staff: Vec<StaffAllocation>,
    /// Dated preparation actions
    pub timeline: Vec<TimelineEntry>,
    /// Readiness score as a percentage
    pub readiness: f64,
}

/// The full output of a forecast run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    /// First forecast date
    pub start_date: NaiveDate,
    /// Surge assessment for every date in the horizon, in date order
    pub daily: Vec<SurgeAssessment>,
    /// The assessment for the peak day (the highest multiplier; earliest on ties)
    pub peak: SurgeAssessment,
    /// Days between the start date and the peak day
    pub days_until_surge: u32,
    /// Preparation plans per facility, in network file order
    pub facility_plans: Vec<FacilityPlan>,
    /// The pooled network view
    pub network: NetworkPlan,
}

/// Run the forecast for every date in the horizon.
///
/// The run is deterministic apart from the narrative text: identical model inputs always
/// produce identical numbers, and the narrative degrades to a deterministic fallback when no
/// generator is configured.
///
/// # Arguments
///
/// * `model` - The loaded model
/// * `generator` - The narrative collaborator, if configured
/// * `today` - The first forecast date
/// * `narrative_timeout` - Upper bound on each collaborator call
pub fn run(
    model: &Model,
    generator: Option<&Arc<dyn NarrativeGenerator>>,
    today: NaiveDate,
    narrative_timeout: Duration,
) -> Result<ForecastReport> {
    let horizon = model.forecast.horizon_days;
    info!("Forecasting {horizon} days from {today} for {} facilities", model.facilities.len());

    // Conditions are city-wide, so each date is assessed once and shared across facilities
    let mut days = Vec::with_capacity(horizon as usize);
    for offset in 0..horizon {
        let date = today
            .checked_add_days(Days::new(u64::from(offset)))
            .ok_or_else(|| anyhow::anyhow!("Date overflow at forecast offset {offset}"))?;
        let snapshot = normalise(date, &model.observations, &model.calendar);
        let assessment = surge::assess(&model.surge, &snapshot, generator, narrative_timeout);
        days.push((snapshot, assessment));
    }

    // Earliest day wins ties, so the strict comparison is deliberate
    let mut peak_index = 0;
    for (index, (_, assessment)) in days.iter().enumerate() {
        if assessment.multiplier > days[peak_index].1.multiplier {
            peak_index = index;
        }
    }
    let (peak_snapshot, peak) = days[peak_index].clone();
    let days_until_surge = peak_index as u32;
    info!(
        "Peak multiplier {} ({}) on {}",
        peak.multiplier, peak.severity, peak.date
    );

    let mut facility_plans = Vec::with_capacity(model.facilities.len());
    let mut summaries = Vec::with_capacity(model.facilities.len());
    for facility in model.facilities.values() {
        let inventory = &model.inventory[&facility.id];

        let predicted_admissions =
            (f64::from(facility.baseline_admissions) * peak.multiplier).round() as u32;
        let admissions = decompose(&model.admissions, predicted_admissions, &peak_snapshot);
        let resource_forecast = resources::project(&model.resources, &admissions);

        let mut plan = procurement::plan(
            &model.procurement,
            &model.catalog,
            &admissions,
            inventory,
            facility.class,
            days_until_surge,
        );
        let budget = match (model.procurement.mode, model.procurement.budget) {
            (PlannerMode::BudgetAware, Some(budget)) => {
                Some(procurement::apply_budget(&mut plan, budget))
            }
            _ => None,
        };

        let staff = procurement::staff_plan(&resource_forecast, inventory);
        let entries = timeline::build(&plan, &staff, today, days_until_surge)?;
        let readiness = timeline::readiness_score(&staff, &plan);

        summaries.push(FacilityResourceSummary {
            facility_id: facility.id.clone(),
            required: plan
                .iter()
                .map(|item| (item.item_id.clone(), item.projected_need))
                .collect(),
            available: plan
                .iter()
                .map(|item| (item.item_id.clone(), item.current_stock))
                .collect(),
        });

        facility_plans.push(FacilityPlan {
            facility_id: facility.id.clone(),
            name: facility.name.clone(),
            class: facility.class,
            predicted_admissions,
            admissions,
            resources: resource_forecast,
            procurement: plan,
            budget,
            staff,
            timeline: entries,
            readiness,
        });
    }

    let network = pooling::optimise(&summaries);
    let daily = days.into_iter().map(|(_, assessment)| assessment).collect();

    Ok(ForecastReport {
        start_date: today,
        daily,
        peak,
        days_until_surge,
        facility_plans,
        network,
    })
}
