//! The surge multiplier calculator.
//!
//! Combines the risk flags from an environmental snapshot into a single multiplicative surge
//! factor and a discrete severity tier. The model is additive: every matched risk factor adds
//! a non-negative weight to a base of 1.0, which makes the multiplier monotone non-decreasing
//! in AQI, rainfall and temperature considered independently.
//!
//! Where the field data carried divergent AQI tier tables, the live-predictor table
//! (+0.5 / +0.2 / +0.1 for AQI above 400 / 300 / 200) is the canonical one.
use crate::calendar::{EventImpact, Season};
use crate::environment::EnvironmentalSnapshot;
use crate::narrative::{self, NarrativeGenerator, NarrativeRequest};
use anyhow::{Result, ensure};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::sync::Arc;
use std::time::Duration;

/// The severity tier of a forecast surge
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum Severity {
    /// Multiplier below the minor threshold
    #[string = "none"]
    None,
    /// Multiplier at or above the minor threshold
    #[string = "minor"]
    Minor,
    /// Multiplier at or above the moderate threshold
    #[string = "moderate"]
    Moderate,
    /// Multiplier at or above the major threshold
    #[string = "major"]
    Major,
    /// Multiplier at or above the critical threshold
    #[string = "critical"]
    Critical,
}

/// A surge risk tier: the factor value must exceed `threshold` for `weight` to apply
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RiskTier {
    /// Strict lower bound on the factor value
    pub threshold: f64,
    /// Amount added to the multiplier when the tier matches
    pub weight: f64,
}

/// Multiplier thresholds for the severity tiers
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SeverityThresholds {
    /// Minimum multiplier for a minor surge
    pub minor: f64,
    /// Minimum multiplier for a moderate surge
    pub moderate: f64,
    /// Minimum multiplier for a major surge
    pub major: f64,
    /// Minimum multiplier for a critical surge
    pub critical: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            minor: 1.2,
            moderate: 1.4,
            major: 1.7,
            critical: 2.0,
        }
    }
}

impl SeverityThresholds {
    /// The severity tier for the given multiplier
    pub fn classify(&self, multiplier: f64) -> Severity {
        if multiplier >= self.critical {
            Severity::Critical
        } else if multiplier >= self.major {
            Severity::Major
        } else if multiplier >= self.moderate {
            Severity::Moderate
        } else if multiplier >= self.minor {
            Severity::Minor
        } else {
            Severity::None
        }
    }
}

fn default_aqi_severe() -> RiskTier {
    RiskTier {
        threshold: 400.0,
        weight: 0.5,
    }
}

fn default_aqi_very_poor() -> RiskTier {
    RiskTier {
        threshold: 300.0,
        weight: 0.2,
    }
}

fn default_aqi_poor() -> RiskTier {
    RiskTier {
        threshold: 200.0,
        weight: 0.1,
    }
}

fn default_heavy_rainfall() -> RiskTier {
    RiskTier {
        threshold: 50.0,
        weight: 0.3,
    }
}

fn default_moderate_rainfall() -> RiskTier {
    RiskTier {
        threshold: 10.0,
        weight: 0.1,
    }
}

fn default_extreme_heat() -> RiskTier {
    RiskTier {
        threshold: 36.0,
        weight: 0.2,
    }
}

fn default_major_festival_weight() -> f64 {
    0.3
}

fn default_minor_event_weight() -> f64 {
    0.1
}

fn default_winter_weight() -> f64 {
    0.1
}

fn default_pre_event_weight() -> f64 {
    0.1
}

fn default_post_event_weight() -> f64 {
    0.15
}

/// Configuration for the surge multiplier calculation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SurgeParameters {
    /// AQI tier for "Severe" air quality
    #[serde(default = "default_aqi_severe")]
    pub aqi_severe: RiskTier,
    /// AQI tier for "Very Poor" air quality
    #[serde(default = "default_aqi_very_poor")]
    pub aqi_very_poor: RiskTier,
    /// AQI tier for "Poor" air quality
    #[serde(default = "default_aqi_poor")]
    pub aqi_poor: RiskTier,
    /// Rainfall tier for heavy rainfall
    #[serde(default = "default_heavy_rainfall")]
    pub heavy_rainfall: RiskTier,
    /// Rainfall tier for moderate rainfall (adds weight but raises no label)
    #[serde(default = "default_moderate_rainfall")]
    pub moderate_rainfall: RiskTier,
    /// Temperature tier for extreme heat
    #[serde(default = "default_extreme_heat")]
    pub extreme_heat: RiskTier,
    /// Weight added per active major festival
    #[serde(default = "default_major_festival_weight")]
    pub major_festival_weight: f64,
    /// Weight added per active minor event
    #[serde(default = "default_minor_event_weight")]
    pub minor_event_weight: f64,
    /// Weight added once during winter months
    #[serde(default = "default_winter_weight")]
    pub winter_weight: f64,
    /// Weight added in the proximity window before a festival
    #[serde(default = "default_pre_event_weight")]
    pub pre_event_weight: f64,
    /// Weight added in the proximity window after a festival
    #[serde(default = "default_post_event_weight")]
    pub post_event_weight: f64,
    /// Multiplier thresholds for severity classification
    #[serde(default)]
    pub severity_thresholds: SeverityThresholds,
}

impl Default for SurgeParameters {
    fn default() -> Self {
        toml::from_str("").expect("Cannot create surge parameters from empty TOML")
    }
}

impl SurgeParameters {
    /// Check the parameter tables are internally consistent.
    ///
    /// All weights must be non-negative (this is what guarantees monotonicity) and the tier
    /// thresholds must be strictly ordered.
    pub fn validate(&self) -> Result<()> {
        let weights = [
            self.aqi_severe.weight,
            self.aqi_very_poor.weight,
            self.aqi_poor.weight,
            self.heavy_rainfall.weight,
            self.moderate_rainfall.weight,
            self.extreme_heat.weight,
            self.major_festival_weight,
            self.minor_event_weight,
            self.winter_weight,
            self.pre_event_weight,
            self.post_event_weight,
        ];
        ensure!(
            weights.iter().all(|weight| *weight >= 0.0),
            "Surge risk weights must be non-negative"
        );
        ensure!(
            self.aqi_severe.threshold > self.aqi_very_poor.threshold
                && self.aqi_very_poor.threshold > self.aqi_poor.threshold,
            "AQI tier thresholds must be strictly decreasing from severe to poor"
        );
        ensure!(
            self.aqi_severe.weight >= self.aqi_very_poor.weight
                && self.aqi_very_poor.weight >= self.aqi_poor.weight,
            "AQI tier weights must be non-increasing from severe to poor"
        );
        ensure!(
            self.heavy_rainfall.threshold > self.moderate_rainfall.threshold
                && self.heavy_rainfall.weight >= self.moderate_rainfall.weight,
            "Heavy rainfall tier must dominate the moderate tier"
        );
        let t = &self.severity_thresholds;
        ensure!(
            t.minor < t.moderate && t.moderate < t.major && t.major < t.critical,
            "Severity thresholds must be strictly increasing"
        );

        Ok(())
    }
}

/// The outcome of assessing one date's environmental snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurgeAssessment {
    /// The assessed date
    pub date: NaiveDate,
    /// The surge multiplier (at least 1.0)
    pub multiplier: f64,
    /// Severity tier of the multiplier
    pub severity: Severity,
    /// Risk factor labels in the order they were raised
    pub risk_factors: Vec<String>,
    /// Short human-readable explanation
    pub narrative: String,
}

/// Assess the surge risk for a snapshot, without producing a narrative.
///
/// Returns the multiplier and the ordered risk factor labels.
fn accumulate_risk(params: &SurgeParameters, snapshot: &EnvironmentalSnapshot) -> (f64, Vec<String>) {
    let mut multiplier = 1.0;
    let mut risk_factors = Vec::new();

    // Air quality, highest matching tier only
    if snapshot.aqi > params.aqi_severe.threshold {
        multiplier += params.aqi_severe.weight;
        risk_factors.push(format!("Severe AQI ({:.0})", snapshot.aqi));
    } else if snapshot.aqi > params.aqi_very_poor.threshold {
        multiplier += params.aqi_very_poor.weight;
        risk_factors.push(format!("Very Poor AQI ({:.0})", snapshot.aqi));
    } else if snapshot.aqi > params.aqi_poor.threshold {
        multiplier += params.aqi_poor.weight;
        risk_factors.push(format!("Poor AQI ({:.0})", snapshot.aqi));
    }

    // Rainfall; the moderate tier contributes weight without a label
    if snapshot.rainfall_mm > params.heavy_rainfall.threshold {
        multiplier += params.heavy_rainfall.weight;
        risk_factors.push(format!("Heavy Rainfall ({:.1}mm)", snapshot.rainfall_mm));
    } else if snapshot.rainfall_mm > params.moderate_rainfall.threshold {
        multiplier += params.moderate_rainfall.weight;
    }

    if snapshot.max_temp_c > params.extreme_heat.threshold {
        multiplier += params.extreme_heat.weight;
        risk_factors.push(format!("Extreme Heat ({:.1}C)", snapshot.max_temp_c));
    }

    for event in &snapshot.active_events {
        match event.impact {
            EventImpact::Major => {
                multiplier += params.major_festival_weight;
                risk_factors.push(format!("Major Festival ({})", event.name));
            }
            EventImpact::Minor => {
                multiplier += params.minor_event_weight;
                risk_factors.push("Festival Event".to_string());
            }
        }
    }

    // Applied once per date, not per event
    if snapshot.season == Season::Winter {
        multiplier += params.winter_weight;
        risk_factors.push("Seasonal Flu".to_string());
    }

    if snapshot.is_pre_event {
        multiplier += params.pre_event_weight;
    }
    if snapshot.is_post_event {
        multiplier += params.post_event_weight;
    }

    (round2(multiplier), risk_factors)
}

/// Round to two decimal places, matching the reported precision of the multiplier
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Assess the surge risk for an environmental snapshot.
///
/// This function cannot fail: missing inputs were already defaulted when the snapshot was
/// built, and narrative generation degrades to a deterministic fallback.
///
/// # Arguments
///
/// * `params` - The surge parameter tables
/// * `snapshot` - The environmental snapshot to assess
/// * `generator` - The narrative collaborator, if configured
/// * `narrative_timeout` - Upper bound on the collaborator call
pub fn assess(
    params: &SurgeParameters,
    snapshot: &EnvironmentalSnapshot,
    generator: Option<&Arc<dyn NarrativeGenerator>>,
    narrative_timeout: Duration,
) -> SurgeAssessment {
    let (multiplier, risk_factors) = accumulate_risk(params, snapshot);
    let severity = params.severity_thresholds.classify(multiplier);

    let narrative = narrative::resolve(
        generator,
        &NarrativeRequest {
            date: snapshot.date,
            risk_factors: risk_factors.clone(),
            multiplier,
        },
        narrative_timeout,
    );

    SurgeAssessment {
        date: snapshot.date,
        multiplier,
        severity,
        risk_factors,
        narrative,
    }
}
