//! Code for working with the festival calendar.
//!
//! Festivals drive two of the surge risk factors: crowd/pollution load on the days a festival
//! is active and elevated load in the days immediately before and after (travel, stockpiling,
//! delayed presentations).
use crate::input::read_vec_from_csv;
use anyhow::{Result, ensure};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::path::Path;

const FESTIVALS_FILE_NAME: &str = "festivals.csv";

/// Number of days before/after a festival window that count as proximity days
const PROXIMITY_WINDOW_DAYS: i64 = 3;

/// Season of the year, derived from the calendar month.
///
/// Mumbai has three seasons for surge purposes: the monsoon (June to September), winter
/// (November to February) and summer (the rest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, SerializeLabeledStringEnum)]
pub enum Season {
    /// March to May, plus October
    #[string = "summer"]
    Summer,
    /// June to September
    #[string = "monsoon"]
    Monsoon,
    /// November to February
    #[string = "winter"]
    Winter,
}

impl Season {
    /// The season for the given date
    pub fn from_date(date: NaiveDate) -> Self {
        match date.month() {
            11 | 12 | 1 | 2 => Season::Winter,
            6..=9 => Season::Monsoon,
            _ => Season::Summer,
        }
    }
}

/// How strongly a festival affects hospital admissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum)]
pub enum EventImpact {
    /// High-impact festivals (e.g. Diwali, Ganesh Chaturthi)
    #[string = "major"]
    Major,
    /// All other observed events
    #[string = "minor"]
    Minor,
}

/// A festival occurrence with a fixed date window
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Festival {
    /// Name of the festival (e.g. "Diwali")
    pub name: String,
    /// First active day
    pub start: NaiveDate,
    /// Last active day (inclusive)
    pub end: NaiveDate,
    /// Impact class of this festival
    pub impact: EventImpact,
}

/// The festival calendar for the modelled region
#[derive(Debug, Clone, PartialEq)]
pub struct FestivalCalendar(Vec<Festival>);

impl FestivalCalendar {
    /// Create a calendar from a list of festival occurrences
    pub fn new(festivals: Vec<Festival>) -> Result<Self> {
        for festival in &festivals {
            ensure!(
                festival.start <= festival.end,
                "Festival {} ends before it starts",
                festival.name
            );
        }

        Ok(Self(festivals))
    }

    /// An empty calendar (no events ever active)
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Festivals active on the given date, in calendar file order
    pub fn active_on(&self, date: NaiveDate) -> Vec<&Festival> {
        self.0
            .iter()
            .filter(|festival| (festival.start..=festival.end).contains(&date))
            .collect()
    }

    /// Whether the date falls in the proximity window before any festival
    pub fn is_pre_event(&self, date: NaiveDate) -> bool {
        self.0.iter().any(|festival| {
            let days_until = (festival.start - date).num_days();
            (1..=PROXIMITY_WINDOW_DAYS).contains(&days_until)
        })
    }

    /// Whether the date falls in the proximity window after any festival
    pub fn is_post_event(&self, date: NaiveDate) -> bool {
        self.0.iter().any(|festival| {
            let days_since = (date - festival.end).num_days();
            (1..=PROXIMITY_WINDOW_DAYS).contains(&days_since)
        })
    }
}

/// Read the festival calendar from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_festivals(model_dir: &Path) -> Result<FestivalCalendar> {
    let file_path = model_dir.join(FESTIVALS_FILE_NAME);
    if !file_path.is_file() {
        // Not every model observes festivals
        return Ok(FestivalCalendar::empty());
    }

    FestivalCalendar::new(read_vec_from_csv(&file_path)?)
}
