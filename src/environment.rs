//! Code for normalising raw environmental observations into per-date snapshots.
//!
//! A snapshot bundles everything the surge calculator needs to know about a single date: air
//! quality, weather, the active festival calendar entries and the season. Snapshots are
//! immutable once constructed.
use crate::calendar::{EventImpact, FestivalCalendar, Season};
use crate::input::read_vec_from_csv;
use anyhow::Result;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const OBSERVATIONS_FILE_NAME: &str = "observations.csv";

/// Fallback AQI when no observation is available (midpoint of the "Moderate" class)
pub const DEFAULT_AQI: f64 = 150.0;

/// Fallback maximum temperature (°C) when no observation is available
pub const DEFAULT_MAX_TEMP_C: f64 = 30.0;

/// Fallback rainfall (mm) when no observation is available
pub const DEFAULT_RAINFALL_MM: f64 = 0.0;

/// A raw environmental observation for a single date
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Observation {
    /// Date of the observation
    pub date: NaiveDate,
    /// Air quality index (CPCB scale, 0-500)
    pub aqi: Option<f64>,
    /// Maximum temperature in °C
    pub max_temp_c: Option<f64>,
    /// Rainfall in mm
    pub rainfall_mm: Option<f64>,
}

/// A lookup table of environmental observations keyed by date
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservationTable(HashMap<NaiveDate, Observation>);

impl ObservationTable {
    /// Create a table from a list of observations. Later entries for the same date win.
    pub fn new(observations: Vec<Observation>) -> Self {
        Self(
            observations
                .into_iter()
                .map(|obs| (obs.date, obs))
                .collect(),
        )
    }

    /// Get the observation for a date, if one was recorded
    pub fn get(&self, date: NaiveDate) -> Option<&Observation> {
        self.0.get(&date)
    }
}

/// A festival active on the snapshot date
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEvent {
    /// Name of the festival
    pub name: String,
    /// Impact class of the festival
    pub impact: EventImpact,
}

/// Normalised environmental conditions for a single date
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentalSnapshot {
    /// The date the snapshot describes
    pub date: NaiveDate,
    /// Air quality index
    pub aqi: f64,
    /// Maximum temperature in °C
    pub max_temp_c: f64,
    /// Rainfall in mm
    pub rainfall_mm: f64,
    /// Festivals active on this date
    pub active_events: Vec<ActiveEvent>,
    /// Season derived from the month
    pub season: Season,
    /// Whether the date is within the proximity window before a festival
    pub is_pre_event: bool,
    /// Whether the date is within the proximity window after a festival
    pub is_post_event: bool,
}

/// Build the environmental snapshot for a date.
///
/// Missing observations never fail: each absent value is replaced with a documented fallback
/// constant so the downstream pipeline always has a complete snapshot to work from.
///
/// # Arguments
///
/// * `date` - The target date
/// * `observations` - Recorded observations by date
/// * `calendar` - The festival calendar
pub fn normalise(
    date: NaiveDate,
    observations: &ObservationTable,
    calendar: &FestivalCalendar,
) -> EnvironmentalSnapshot {
    let observation = observations.get(date);

    let active_events = calendar
        .active_on(date)
        .into_iter()
        .map(|festival| ActiveEvent {
            name: festival.name.clone(),
            impact: festival.impact,
        })
        .collect();

    EnvironmentalSnapshot {
        date,
        aqi: observation.and_then(|o| o.aqi).unwrap_or(DEFAULT_AQI),
        max_temp_c: observation
            .and_then(|o| o.max_temp_c)
            .unwrap_or(DEFAULT_MAX_TEMP_C),
        rainfall_mm: observation
            .and_then(|o| o.rainfall_mm)
            .unwrap_or(DEFAULT_RAINFALL_MM),
        active_events,
        season: Season::from_date(date),
        is_pre_event: calendar.is_pre_event(date),
        is_post_event: calendar.is_post_event(date),
    }
}

/// Read environmental observations from the specified model directory.
///
/// The file is optional; a missing file yields an empty table and fallback values apply for
/// every date.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_observations(model_dir: &Path) -> Result<ObservationTable> {
    let file_path = model_dir.join(OBSERVATIONS_FILE_NAME);
    if !file_path.is_file() {
        return Ok(ObservationTable::default());
    }

    Ok(ObservationTable::new(read_vec_from_csv(&file_path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Festival;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_normalise_with_observation() {
        let observations = ObservationTable::new(vec![Observation {
            date: date("2024-11-02"),
            aqi: Some(420.0),
            max_temp_c: Some(33.0),
            rainfall_mm: Some(2.5),
        }]);
        let calendar = FestivalCalendar::new(vec![Festival {
            name: "Diwali".to_string(),
            start: date("2024-11-01"),
            end: date("2024-11-03"),
            impact: EventImpact::Major,
        }])
        .unwrap();

        let snapshot = normalise(date("2024-11-02"), &observations, &calendar);
        assert_eq!(snapshot.aqi, 420.0);
        assert_eq!(snapshot.max_temp_c, 33.0);
        assert_eq!(snapshot.rainfall_mm, 2.5);
        assert_eq!(snapshot.season, Season::Winter);
        assert_eq!(snapshot.active_events.len(), 1);
        assert_eq!(snapshot.active_events[0].name, "Diwali");
        assert!(!snapshot.is_pre_event);
        assert!(!snapshot.is_post_event);
    }

    #[test]
    fn test_normalise_missing_observation_uses_fallbacks() {
        let snapshot = normalise(
            date("2024-05-10"),
            &ObservationTable::default(),
            &FestivalCalendar::empty(),
        );
        assert_eq!(snapshot.aqi, DEFAULT_AQI);
        assert_eq!(snapshot.max_temp_c, DEFAULT_MAX_TEMP_C);
        assert_eq!(snapshot.rainfall_mm, DEFAULT_RAINFALL_MM);
        assert!(snapshot.active_events.is_empty());
        assert_eq!(snapshot.season, Season::Summer);
    }

    #[test]
    fn test_normalise_partial_observation() {
        let observations = ObservationTable::new(vec![Observation {
            date: date("2024-05-10"),
            aqi: Some(95.0),
            max_temp_c: None,
            rainfall_mm: None,
        }]);
        let snapshot = normalise(
            date("2024-05-10"),
            &observations,
            &FestivalCalendar::empty(),
        );
        assert_eq!(snapshot.aqi, 95.0);
        assert_eq!(snapshot.max_temp_c, DEFAULT_MAX_TEMP_C);
        assert_eq!(snapshot.rainfall_mm, DEFAULT_RAINFALL_MM);
    }

    #[test]
    fn test_read_observations() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(OBSERVATIONS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "date,aqi,max_temp_c,rainfall_mm\n2024-11-01,310,31,0\n2024-11-02,420,33,2.5"
            )
            .unwrap();
        }

        let table = read_observations(dir.path()).unwrap();
        assert_eq!(table.get(date("2024-11-01")).unwrap().aqi, Some(310.0));
        assert!(table.get(date("2024-10-31")).is_none());
    }

    #[test]
    fn test_read_observations_missing_file() {
        let dir = tempdir().unwrap();
        assert_eq!(
            read_observations(dir.path()).unwrap(),
            ObservationTable::default()
        );
    }
}
