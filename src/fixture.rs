//! Shared helpers for unit tests
use crate::admissions::AdmissionBreakdown;
use crate::calendar::Season;
use crate::environment::EnvironmentalSnapshot;
use crate::supply::SupplyItem;
use float_cmp::approx_eq;

/// Assert that two floats are equal to within a small tolerance
pub fn assert_approx(actual: f64, expected: f64) {
    assert!(
        approx_eq!(f64, actual, expected, epsilon = 1e-9),
        "assertion failed: {actual} != {expected}"
    );
}

/// A quiet pre-monsoon day with no risk factors of any kind
pub fn snapshot() -> EnvironmentalSnapshot {
    EnvironmentalSnapshot {
        date: "2024-05-15".parse().unwrap(),
        aqi: 100.0,
        max_temp_c: 30.0,
        rainfall_mm: 0.0,
        active_events: Vec::new(),
        season: Season::Summer,
        is_pre_event: false,
        is_post_event: false,
    }
}

/// An oxygen cylinder catalog entry
pub fn oxygen_cylinders() -> SupplyItem {
    SupplyItem {
        id: "oxygen_cylinders".into(),
        respiratory: 0.3,
        waterborne: 0.05,
        heat_related: 0.2,
        trauma: 0.3,
        other: 0.25,
        lead_time_days: 1,
        criticality: 0.95,
        unit_cost: 4500.0,
    }
}

/// An admission breakdown at the default baseline shares for the given total
pub fn breakdown(total: u32) -> AdmissionBreakdown {
    let count = |share: f64| (f64::from(total) * share + 1e-9) as u32;
    let respiratory = count(0.15);
    let waterborne = count(0.10);
    let heat_related = count(0.05);
    let trauma = count(0.20);

    AdmissionBreakdown {
        total,
        respiratory,
        waterborne,
        heat_related,
        trauma,
        other: total.saturating_sub(respiratory + waterborne + heat_related + trauma),
    }
}
