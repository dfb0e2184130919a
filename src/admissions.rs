//! The admission decomposer.
//!
//! Splits a total admission count into the five disease categories using baseline percentages
//! boosted by the environmental risk flags, then renormalised so the categories always sum
//! exactly to the total.
use crate::environment::EnvironmentalSnapshot;
use crate::input::deserialise_proportion;
use anyhow::{Result, ensure};
use float_cmp::approx_eq;
use serde::{Deserialize, Serialize};

fn default_respiratory_baseline() -> f64 {
    0.15
}

fn default_waterborne_baseline() -> f64 {
    0.10
}

fn default_heat_baseline() -> f64 {
    0.05
}

fn default_trauma_baseline() -> f64 {
    0.20
}

fn default_other_baseline() -> f64 {
    0.50
}

fn default_respiratory_boost() -> f64 {
    0.15
}

fn default_waterborne_boost() -> f64 {
    0.15
}

fn default_heat_boost() -> f64 {
    0.10
}

fn default_trauma_boost() -> f64 {
    0.12
}

fn default_aqi_threshold() -> f64 {
    200.0
}

fn default_rainfall_threshold() -> f64 {
    20.0
}

fn default_temperature_threshold() -> f64 {
    35.0
}

/// Configuration for the admission category decomposition
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdmissionParameters {
    /// Baseline share of respiratory admissions
    #[serde(
        default = "default_respiratory_baseline",
        deserialize_with = "deserialise_proportion"
    )]
    pub respiratory_baseline: f64,
    /// Baseline share of waterborne admissions
    #[serde(
        default = "default_waterborne_baseline",
        deserialize_with = "deserialise_proportion"
    )]
    pub waterborne_baseline: f64,
    /// Baseline share of heat-related admissions
    #[serde(
        default = "default_heat_baseline",
        deserialize_with = "deserialise_proportion"
    )]
    pub heat_baseline: f64,
    /// Baseline share of trauma admissions
    #[serde(
        default = "default_trauma_baseline",
        deserialize_with = "deserialise_proportion"
    )]
    pub trauma_baseline: f64,
    /// Baseline share of other admissions
    #[serde(
        default = "default_other_baseline",
        deserialize_with = "deserialise_proportion"
    )]
    pub other_baseline: f64,
    /// Percentage points added to the respiratory share when AQI exceeds its threshold
    #[serde(default = "default_respiratory_boost")]
    pub respiratory_boost: f64,
    /// Percentage points added to the waterborne share when rainfall exceeds its threshold
    #[serde(default = "default_waterborne_boost")]
    pub waterborne_boost: f64,
    /// Percentage points added to the heat-related share when temperature exceeds its threshold
    #[serde(default = "default_heat_boost")]
    pub heat_boost: f64,
    /// Percentage points added to the trauma share when any event is active
    #[serde(default = "default_trauma_boost")]
    pub trauma_boost: f64,
    /// AQI above which the respiratory boost applies
    #[serde(default = "default_aqi_threshold")]
    pub aqi_threshold: f64,
    /// Rainfall (mm) above which the waterborne boost applies
    #[serde(default = "default_rainfall_threshold")]
    pub rainfall_threshold: f64,
    /// Temperature (°C) above which the heat boost applies
    #[serde(default = "default_temperature_threshold")]
    pub temperature_threshold: f64,
}

impl Default for AdmissionParameters {
    fn default() -> Self {
        toml::from_str("").expect("Cannot create admission parameters from empty TOML")
    }
}

impl AdmissionParameters {
    /// Check the baselines form a complete distribution and the boosts are non-negative
    pub fn validate(&self) -> Result<()> {
        let baseline_sum = self.respiratory_baseline
            + self.waterborne_baseline
            + self.heat_baseline
            + self.trauma_baseline
            + self.other_baseline;
        ensure!(
            approx_eq!(f64, baseline_sum, 1.0, epsilon = 1e-9),
            "Admission category baselines must sum to 1.0 (got {baseline_sum})"
        );

        let boosts = [
            self.respiratory_boost,
            self.waterborne_boost,
            self.heat_boost,
            self.trauma_boost,
        ];
        ensure!(
            boosts.iter().all(|boost| *boost >= 0.0),
            "Admission category boosts must be non-negative"
        );

        Ok(())
    }
}

/// A total admission count split into disease categories.
///
/// The five category fields always sum exactly to `total`; `other` absorbs the rounding
/// remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdmissionBreakdown {
    /// Total admissions
    pub total: u32,
    /// Respiratory admissions
    pub respiratory: u32,
    /// Waterborne admissions
    pub waterborne: u32,
    /// Heat-related admissions
    pub heat_related: u32,
    /// Trauma admissions
    pub trauma: u32,
    /// All other admissions
    pub other: u32,
}

/// Decompose a total admission count into disease categories for the given conditions.
///
/// The boosted weights are renormalised to sum to one before being applied, and each category
/// count is truncated to an integer. Because truncation only ever shrinks the four named
/// categories, the `other` remainder cannot go negative; the `saturating_sub` is belt and
/// braces for the degenerate all-zero-weight case.
///
/// # Arguments
///
/// * `params` - The decomposition parameter tables
/// * `total` - Total admissions to split
/// * `snapshot` - Environmental conditions for the date
pub fn decompose(
    params: &AdmissionParameters,
    total: u32,
    snapshot: &EnvironmentalSnapshot,
) -> AdmissionBreakdown {
    let mut respiratory_weight = params.respiratory_baseline;
    if snapshot.aqi > params.aqi_threshold {
        respiratory_weight += params.respiratory_boost;
    }

    let mut waterborne_weight = params.waterborne_baseline;
    if snapshot.rainfall_mm > params.rainfall_threshold {
        waterborne_weight += params.waterborne_boost;
    }

    let mut heat_weight = params.heat_baseline;
    if snapshot.max_temp_c > params.temperature_threshold {
        heat_weight += params.heat_boost;
    }

    let mut trauma_weight = params.trauma_baseline;
    if !snapshot.active_events.is_empty() {
        trauma_weight += params.trauma_boost;
    }

    let weight_sum = respiratory_weight
        + waterborne_weight
        + heat_weight
        + trauma_weight
        + params.other_baseline;

    // The epsilon guards the truncation against float dust in the renormalised shares
    let count = |weight: f64| (f64::from(total) * weight / weight_sum + 1e-9) as u32;
    let respiratory = count(respiratory_weight);
    let waterborne = count(waterborne_weight);
    let heat_related = count(heat_weight);
    let trauma = count(trauma_weight);
    let other = total.saturating_sub(respiratory + waterborne + heat_related + trauma);

    AdmissionBreakdown {
        total,
        respiratory,
        waterborne,
        heat_related,
        trauma,
        other,
    }
}

impl AdmissionBreakdown {
    /// The category counts as (respiratory, waterborne, heat_related, trauma, other)
    pub fn categories(&self) -> [u32; 5] {
        [
            self.respiratory,
            self.waterborne,
            self.heat_related,
            self.trauma,
            self.other,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ActiveEvent;
    use crate::fixture::snapshot;
    use crate::calendar::EventImpact;
    use rstest::rstest;

    fn assert_invariant(breakdown: &AdmissionBreakdown) {
        assert_eq!(
            breakdown.categories().iter().sum::<u32>(),
            breakdown.total
        );
    }

    #[test]
    fn test_decompose_baseline_shares() {
        let params = AdmissionParameters::default();
        let breakdown = decompose(&params, 100, &snapshot());
        assert_eq!(breakdown.respiratory, 15);
        assert_eq!(breakdown.waterborne, 10);
        assert_eq!(breakdown.heat_related, 5);
        assert_eq!(breakdown.trauma, 20);
        assert_eq!(breakdown.other, 50);
        assert_invariant(&breakdown);
    }

    #[test]
    fn test_decompose_respiratory_boost() {
        let params = AdmissionParameters::default();
        let mut snapshot = snapshot();
        snapshot.aqi = 350.0;
        let breakdown = decompose(&params, 150, &snapshot);

        // Boosted weight 0.30 over a renormalised sum of 1.15
        assert_eq!(breakdown.respiratory, 39);
        assert_invariant(&breakdown);

        // Respiratory share grows relative to the quiet baseline
        let quiet = decompose(&params, 150, &crate::fixture::snapshot());
        assert!(breakdown.respiratory > quiet.respiratory);
    }

    #[test]
    fn test_decompose_rain_and_festival() {
        let params = AdmissionParameters::default();
        let mut snapshot = snapshot();
        snapshot.rainfall_mm = 80.0;
        snapshot.active_events = vec![ActiveEvent {
            name: "Ganesh Chaturthi".to_string(),
            impact: EventImpact::Major,
        }];
        let breakdown = decompose(&params, 150, &snapshot);

        let quiet = decompose(&params, 150, &crate::fixture::snapshot());
        assert!(breakdown.waterborne > quiet.waterborne);
        assert!(breakdown.trauma > quiet.trauma);
        assert_invariant(&breakdown);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(7)]
    #[case(150)]
    #[case(10_000)]
    fn test_sum_invariant_across_totals(#[case] total: u32) {
        let params = AdmissionParameters::default();
        let mut snapshot = snapshot();
        snapshot.aqi = 450.0;
        snapshot.rainfall_mm = 80.0;
        snapshot.max_temp_c = 39.0;
        snapshot.active_events = vec![ActiveEvent {
            name: "Diwali".to_string(),
            impact: EventImpact::Major,
        }];
        assert_invariant(&decompose(&params, total, &snapshot));
    }

    #[test]
    fn test_boost_threshold_is_strict() {
        let params = AdmissionParameters::default();
        let mut snapshot = snapshot();

        snapshot.aqi = 200.0;
        let at = decompose(&params, 1000, &snapshot);
        snapshot.aqi = 201.0;
        let above = decompose(&params, 1000, &snapshot);
        assert_eq!(at.respiratory, 150);
        assert!(above.respiratory > at.respiratory);
    }

    #[test]
    fn test_validate_rejects_bad_baselines() {
        let mut params = AdmissionParameters::default();
        params.other_baseline = 0.4;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_default_params() {
        AdmissionParameters::default().validate().unwrap();
    }
}
