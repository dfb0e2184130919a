//! The action timeline builder and readiness score.
//!
//! Turns a procurement plan and staffing plan into a dated checklist of actions leading up to
//! the surge peak, and summarises how ready the facility is right now.
use crate::procurement::{ProcurementItem, StaffAllocation};
use anyhow::Result;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// Priority score above which a procurement action is urgent
const URGENT_PRIORITY: f64 = 80.0;

/// Days before the surge peak by which extra staff should be in place
const STAFF_DEPLOYMENT_LEAD_DAYS: u32 = 2;

/// Weight of staffing coverage in the readiness score
const STAFF_READINESS_WEIGHT: f64 = 0.6;

/// Weight of supply coverage in the readiness score
const SUPPLY_READINESS_WEIGHT: f64 = 0.4;

/// How soon an action needs attention
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum ActionPriority {
    /// Must be acted on today
    #[string = "URGENT"]
    Urgent,
    /// Staffing changes ahead of the surge
    #[string = "HIGH"]
    High,
    /// Routine ordering within the delivery window
    #[string = "NORMAL"]
    Normal,
}

/// The kind of action
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum ActionCategory {
    /// Place a supply order
    #[string = "procurement"]
    Procurement,
    /// Call in additional staff
    #[string = "staffing"]
    Staffing,
}

/// One dated action in the preparation timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    /// When to act
    pub date: NaiveDate,
    /// Days between today and the action date
    pub days_from_now: u32,
    /// What to do
    pub action: String,
    /// Units or headcount involved
    pub quantity: u64,
    /// How soon the action needs attention
    pub priority: ActionPriority,
    /// The kind of action
    pub category: ActionCategory,
}

/// Build the preparation timeline for one facility.
///
/// Supply orders are scheduled to land one day before the surge peak; staff deployments are
/// scheduled two days before it. Actions whose ideal date has already passed are scheduled for
/// today. Entries are sorted by ascending action date, procurement before staffing on ties.
///
/// # Arguments
///
/// * `procurement` - The facility's procurement plan
/// * `staff` - The facility's staffing plan
/// * `today` - The forecast start date
/// * `days_until_surge` - Days from today until the surge peak
pub fn build(
    procurement: &[ProcurementItem],
    staff: &[StaffAllocation],
    today: NaiveDate,
    days_until_surge: u32,
) -> Result<Vec<TimelineEntry>> {
    let mut entries = Vec::new();

    for item in procurement {
        if item.to_order == 0 {
            continue;
        }

        // Orders land a day before the peak; lead times already past clamp to today
        let days_from_now = days_until_surge
            .saturating_sub(item.lead_time_days)
            .saturating_sub(1);
        let priority = if item.priority_score > URGENT_PRIORITY {
            ActionPriority::Urgent
        } else {
            ActionPriority::Normal
        };

        entries.push(TimelineEntry {
            date: advance(today, days_from_now)?,
            days_from_now,
            action: format!("Order {} units of {}", item.to_order, item.item_id),
            quantity: item.to_order,
            priority,
            category: ActionCategory::Procurement,
        });
    }

    for allocation in staff {
        if allocation.additional_needed == 0 {
            continue;
        }

        let days_from_now = days_until_surge.saturating_sub(STAFF_DEPLOYMENT_LEAD_DAYS);
        entries.push(TimelineEntry {
            date: advance(today, days_from_now)?,
            days_from_now,
            action: format!(
                "Deploy {} additional {}",
                allocation.additional_needed, allocation.role
            ),
            quantity: u64::from(allocation.additional_needed),
            priority: ActionPriority::High,
            category: ActionCategory::Staffing,
        });
    }

    // Stable, so same-day entries keep plan order
    entries.sort_by_key(|entry| entry.days_from_now);

    Ok(entries)
}

fn advance(date: NaiveDate, days: u32) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| anyhow::anyhow!("Date overflow computing timeline for {date}"))
}

/// The facility's readiness for the surge as a percentage.
///
/// A weighted blend of the mean per-role staffing coverage and the mean per-item supply
/// coverage. Planned deployments and pending orders count toward coverage, so a facility whose
/// plan fully closes every gap scores 100 even before the actions happen. Each coverage is
/// capped at 100%; a facility with no requirements at all scores 100.
pub fn readiness_score(staff: &[StaffAllocation], procurement: &[ProcurementItem]) -> f64 {
    let staff_coverage = mean_coverage(staff.iter().map(|allocation| {
        coverage(
            u64::from(allocation.available) + u64::from(allocation.additional_needed),
            u64::from(allocation.required),
        )
    }));
    let supply_coverage = mean_coverage(
        procurement
            .iter()
            .map(|item| coverage(item.current_stock + item.to_order, item.projected_need)),
    );
    let score = STAFF_READINESS_WEIGHT * staff_coverage + SUPPLY_READINESS_WEIGHT * supply_coverage;

    (score * 10.0).round() / 10.0
}

fn coverage(planned: u64, required: u64) -> f64 {
    if required == 0 {
        100.0
    } else {
        (100.0 * planned as f64 / required as f64).min(100.0)
    }
}

fn mean_coverage(coverages: impl Iterator<Item = f64>) -> f64 {
    let mut count: u32 = 0;
    let mut sum = 0.0;
    for value in coverages {
        count += 1;
        sum += value;
    }

    if count == 0 { 100.0 } else { sum / f64::from(count) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_approx;
    use crate::procurement::StockStatus;
    use crate::resources::StaffRole;

    fn order(item: &str, to_order: u64, lead: u32, priority: f64, immediately: bool) -> ProcurementItem {
        ProcurementItem {
            item_id: item.into(),
            required: to_order,
            projected_need: to_order,
            current_stock: 0,
            to_order,
            stock_percentage: 0.0,
            status: StockStatus::Critical,
            priority_score: priority,
            lead_time_days: lead,
            delivery_possible: !immediately,
            order_immediately: immediately,
            unit_cost: 100.0,
        }
    }

    fn deployment(role: StaffRole, additional: u32) -> StaffAllocation {
        StaffAllocation {
            role,
            required: additional,
            available: 0,
            additional_needed: additional,
        }
    }

    #[test]
    fn test_build_schedules_orders_and_staff() {
        let today: NaiveDate = "2024-11-01".parse().unwrap();
        let procurement = [order("ppe_kits", 900, 2, 45.0, false)];
        let staff = [deployment(StaffRole::Nurses, 12)];

        let entries = build(&procurement, &staff, today, 5).unwrap();
        assert_eq!(entries.len(), 2);

        // Order lands a day early: 5 - 2 - 1 = 2 days from now
        assert_eq!(entries[0].days_from_now, 2);
        assert_eq!(entries[0].date, "2024-11-03".parse().unwrap());
        assert_eq!(entries[0].priority, ActionPriority::Normal);
        assert_eq!(entries[0].action, "Order 900 units of ppe_kits");

        // Staff deploy two days before the peak
        assert_eq!(entries[1].days_from_now, 3);
        assert_eq!(entries[1].priority, ActionPriority::High);
        assert_eq!(entries[1].action, "Deploy 12 additional nurses");
    }

    #[test]
    fn test_build_urgent_orders_today() {
        let today: NaiveDate = "2024-11-01".parse().unwrap();
        let procurement = [order("oxygen_cylinders", 300, 2, 95.0, true)];

        let entries = build(&procurement, &[], today, 1).unwrap();
        assert_eq!(entries[0].days_from_now, 0);
        assert_eq!(entries[0].date, today);
        assert_eq!(entries[0].priority, ActionPriority::Urgent);
    }

    #[test]
    fn test_build_high_priority_keeps_delivery_window() {
        let today: NaiveDate = "2024-11-01".parse().unwrap();
        // Urgent, but six days of slack against a one-day lead time
        let procurement = [order("oxygen_cylinders", 300, 1, 95.0, true)];

        let entries = build(&procurement, &[], today, 6).unwrap();
        assert_eq!(entries[0].days_from_now, 4);
        assert_eq!(entries[0].date, "2024-11-05".parse().unwrap());
        assert_eq!(entries[0].priority, ActionPriority::Urgent);
    }

    #[test]
    fn test_build_label_follows_priority_score() {
        let today: NaiveDate = "2024-11-01".parse().unwrap();
        // Delivery cannot arrive in time, but the score stays moderate
        let procurement = [order("iv_fluids_ml", 500, 4, 50.0, true)];

        let entries = build(&procurement, &[], today, 2).unwrap();
        assert_eq!(entries[0].days_from_now, 0);
        assert_eq!(entries[0].priority, ActionPriority::Normal);
    }

    #[test]
    fn test_build_skips_satisfied_lines() {
        let today: NaiveDate = "2024-11-01".parse().unwrap();
        let procurement = [order("ppe_kits", 0, 2, 0.0, false)];
        let staff = [StaffAllocation {
            role: StaffRole::Doctors,
            required: 10,
            available: 12,
            additional_needed: 0,
        }];

        let entries = build(&procurement, &staff, today, 5).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_build_sorted_by_date() {
        let today: NaiveDate = "2024-11-01".parse().unwrap();
        let procurement = [
            order("bed_linens", 200, 1, 20.0, false),
            order("oxygen_cylinders", 300, 4, 90.0, false),
        ];

        let entries = build(&procurement, &[], today, 6).unwrap();
        // Longer lead time means an earlier order date
        assert_eq!(entries[0].action, "Order 300 units of oxygen_cylinders");
        assert_eq!(entries[0].days_from_now, 1);
        assert_eq!(entries[1].days_from_now, 4);
    }

    #[test]
    fn test_readiness_score_counts_planned_actions() {
        let staff = [StaffAllocation {
            role: StaffRole::Doctors,
            required: 10,
            available: 8,
            additional_needed: 2,
        }];
        let mut item = order("ppe_kits", 500, 2, 0.0, false);
        item.projected_need = 1000;
        item.current_stock = 500;

        // The plan closes both gaps entirely
        assert_approx(readiness_score(&staff, &[item]), 100.0);
    }

    #[test]
    fn test_readiness_score_partial_coverage() {
        let staff = [
            StaffAllocation {
                role: StaffRole::Doctors,
                required: 10,
                available: 8,
                additional_needed: 2,
            },
            StaffAllocation {
                role: StaffRole::Nurses,
                required: 30,
                available: 24,
                additional_needed: 0,
            },
        ];
        // A budget-trimmed order leaves a gap on one item
        let mut short = order("ppe_kits", 200, 2, 0.0, false);
        short.projected_need = 1000;
        short.current_stock = 500;
        let mut full = order("bed_linens", 0, 2, 0.0, false);
        full.projected_need = 200;
        full.current_stock = 200;

        // Staff mean (100 + 80) / 2, supply mean (70 + 100) / 2
        assert_approx(readiness_score(&staff, &[short, full]), 88.0);
    }

    #[test]
    fn test_readiness_score_caps_at_100() {
        let staff = [StaffAllocation {
            role: StaffRole::Doctors,
            required: 10,
            available: 50,
            additional_needed: 0,
        }];
        let mut item = order("ppe_kits", 0, 2, 0.0, false);
        item.projected_need = 100;
        item.current_stock = 900;

        assert_approx(readiness_score(&staff, &[item]), 100.0);
    }

    #[test]
    fn test_readiness_score_no_requirements() {
        assert_approx(readiness_score(&[], &[]), 100.0);
    }
}
