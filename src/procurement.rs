//! The facility-level procurement planner.
//!
//! Converts an admission breakdown into a buffered per-item order plan, scores each shortage
//! for clinical urgency and, in budget-aware mode, trims the plan to a spending cap in
//! priority order.
use crate::admissions::AdmissionBreakdown;
use crate::facility::{FacilityClass, FacilityInventory};
use crate::resources::{ResourceForecast, StaffRole};
use crate::supply::{ItemID, SupplyCatalog};
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// Stock below this percentage of projected need is critical
const CRITICAL_STOCK_PERCENTAGE: f64 = 50.0;

/// Stock below this percentage of projected need is low
const LOW_STOCK_PERCENTAGE: f64 = 80.0;

/// Priority score above which an order should be placed immediately
const IMMEDIATE_ORDER_PRIORITY: f64 = 80.0;

/// Days over which time urgency decays once the delivery window has slack
const URGENCY_DECAY_DAYS: f64 = 7.0;

fn default_municipal_buffer() -> f64 {
    0.30
}

fn default_private_buffer() -> f64 {
    0.20
}

/// How the planner treats the spending cap
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum PlannerMode {
    /// Order everything the plan calls for, regardless of cost
    #[default]
    #[string = "clinical_priority"]
    ClinicalPriority,
    /// Fund orders in priority order until the budget is exhausted
    #[string = "budget_aware"]
    BudgetAware,
}

/// Configuration for the procurement planner
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProcurementParameters {
    /// Safety buffer applied to municipal facilities
    #[serde(default = "default_municipal_buffer")]
    pub municipal_buffer: f64,
    /// Safety buffer applied to private facilities
    #[serde(default = "default_private_buffer")]
    pub private_buffer: f64,
    /// Planner mode
    #[serde(default)]
    pub mode: PlannerMode,
    /// Per-facility spending cap, required in budget-aware mode
    #[serde(default)]
    pub budget: Option<f64>,
}

impl Default for ProcurementParameters {
    fn default() -> Self {
        toml::from_str("").expect("Cannot create procurement parameters from empty TOML")
    }
}

impl ProcurementParameters {
    /// Check the buffers and budget are usable
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.municipal_buffer >= 0.0 && self.private_buffer >= 0.0,
            "Safety buffers must be non-negative"
        );
        if let Some(budget) = self.budget {
            ensure!(budget >= 0.0, "Budget must be non-negative");
        }
        ensure!(
            self.mode == PlannerMode::ClinicalPriority || self.budget.is_some(),
            "Budget-aware mode requires a budget"
        );

        Ok(())
    }

    /// The safety buffer for a facility class
    pub fn buffer_for(&self, class: FacilityClass) -> f64 {
        match class {
            FacilityClass::Municipal => self.municipal_buffer,
            FacilityClass::Private => self.private_buffer,
        }
    }
}

/// Stock adequacy relative to projected need
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum StockStatus {
    /// Below half of projected need
    #[string = "CRITICAL"]
    Critical,
    /// Below 80% of projected need
    #[string = "LOW"]
    Low,
    /// At or above 80% of projected need
    #[string = "OK"]
    Ok,
}

/// One line of a facility's procurement plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcurementItem {
    /// The supply item
    pub item_id: ItemID,
    /// Units needed for the forecast admissions, before the safety buffer
    pub required: u64,
    /// Units needed including the safety buffer
    pub projected_need: u64,
    /// Units currently on hand
    pub current_stock: u64,
    /// Units to order
    pub to_order: u64,
    /// Current stock as a percentage of projected need
    pub stock_percentage: f64,
    /// Stock adequacy
    pub status: StockStatus,
    /// Clinical urgency score in [0, 100]
    pub priority_score: f64,
    /// Days between placing an order and delivery
    pub lead_time_days: u32,
    /// Whether delivery can arrive before the surge
    pub delivery_possible: bool,
    /// Whether the order should be placed today
    pub order_immediately: bool,
    /// Cost per unit
    pub unit_cost: f64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn stock_status(stock_percentage: f64) -> StockStatus {
    if stock_percentage < CRITICAL_STOCK_PERCENTAGE {
        StockStatus::Critical
    } else if stock_percentage < LOW_STOCK_PERCENTAGE {
        StockStatus::Low
    } else {
        StockStatus::Ok
    }
}

/// Urgency factor in [0, 1]: full urgency when the delivery window has no slack, decaying to
/// zero over the following week
fn time_urgency(days_until_surge: u32, lead_time_days: u32) -> f64 {
    if days_until_surge <= lead_time_days {
        1.0
    } else {
        let slack = f64::from(days_until_surge - lead_time_days);
        (1.0 - slack / URGENCY_DECAY_DAYS).max(0.0)
    }
}

/// Build the procurement plan for one facility.
///
/// Every catalog item appears in the plan, including those already adequately stocked. The
/// plan is sorted by descending priority score; ties keep catalog order.
///
/// # Arguments
///
/// * `params` - The planner configuration
/// * `catalog` - The supply catalog
/// * `admissions` - Forecast admissions at the surge peak
/// * `inventory` - Current stock at the facility
/// * `class` - The facility's ownership class
/// * `days_until_surge` - Days from today until the surge peak
pub fn plan(
    params: &ProcurementParameters,
    catalog: &SupplyCatalog,
    admissions: &AdmissionBreakdown,
    inventory: &FacilityInventory,
    class: FacilityClass,
    days_until_surge: u32,
) -> Vec<ProcurementItem> {
    let buffer = params.buffer_for(class);

    let mut items: Vec<_> = catalog
        .values()
        .map(|item| {
            let base_need = item.base_need(admissions);
            let required = base_need as u64;
            let projected_need = (base_need * (1.0 + buffer)) as u64;
            let current_stock = inventory.stock_of(&item.id);
            let to_order = projected_need.saturating_sub(current_stock);

            let stock_percentage = if projected_need == 0 {
                100.0
            } else {
                round1(100.0 * current_stock as f64 / projected_need as f64)
            };

            let shortage_ratio = if required == 0 {
                0.0
            } else {
                required.saturating_sub(current_stock) as f64 / required as f64
            };
            let urgency = time_urgency(days_until_surge, item.lead_time_days);
            let priority_score = round1(100.0 * shortage_ratio * urgency * item.criticality);

            let delivery_possible = days_until_surge > item.lead_time_days;
            let order_immediately =
                to_order > 0 && (priority_score > IMMEDIATE_ORDER_PRIORITY || !delivery_possible);

            ProcurementItem {
                item_id: item.id.clone(),
                required,
                projected_need,
                current_stock,
                to_order,
                stock_percentage,
                status: stock_status(stock_percentage),
                priority_score,
                lead_time_days: item.lead_time_days,
                delivery_possible,
                order_immediately,
                unit_cost: item.unit_cost,
            }
        })
        .collect();

    // Stable, so equal scores keep catalog order
    items.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));

    items
}

/// The result of trimming a plan to a budget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetOutcome {
    /// Total cost of the funded orders
    pub total_cost: f64,
    /// Funded cost as a percentage of the budget
    pub budget_utilisation: f64,
    /// Units left unfunded, per item
    pub unfunded: IndexMap<ItemID, u64>,
}

/// Trim `to_order` quantities to fit within `budget`, funding in plan order.
///
/// The plan must already be sorted by descending priority. When an order cannot be funded in
/// full, as many whole units as the remaining budget allows are kept and the rest is recorded
/// as unfunded.
pub fn apply_budget(items: &mut [ProcurementItem], budget: f64) -> BudgetOutcome {
    let mut remaining = budget;
    let mut total_cost = 0.0;
    let mut unfunded = IndexMap::new();

    for item in items.iter_mut() {
        if item.to_order == 0 {
            continue;
        }

        let cost = item.to_order as f64 * item.unit_cost;
        if cost <= remaining {
            remaining -= cost;
            total_cost += cost;
            continue;
        }

        let affordable = if item.unit_cost > 0.0 {
            ((remaining / item.unit_cost) as u64).min(item.to_order)
        } else {
            item.to_order
        };
        let funded_cost = affordable as f64 * item.unit_cost;
        remaining -= funded_cost;
        total_cost += funded_cost;
        unfunded.insert(item.item_id.clone(), item.to_order - affordable);
        item.to_order = affordable;
    }

    let budget_utilisation = if budget > 0.0 {
        round1(100.0 * total_cost / budget)
    } else {
        0.0
    };

    BudgetOutcome {
        total_cost,
        budget_utilisation,
        unfunded,
    }
}

/// One role of a facility's staffing plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffAllocation {
    /// The staff role
    pub role: StaffRole,
    /// Headcount needed for the forecast admissions
    pub required: u32,
    /// Headcount currently available
    pub available: u32,
    /// Extra headcount to call in
    pub additional_needed: u32,
}

/// Compare the staffing forecast against current headcount
pub fn staff_plan(
    forecast: &ResourceForecast,
    inventory: &FacilityInventory,
) -> Vec<StaffAllocation> {
    forecast
        .required_staff()
        .into_iter()
        .map(|(role, required)| {
            let available = inventory.staff_of(role);
            StaffAllocation {
                role,
                required,
                available,
                additional_needed: required.saturating_sub(available),
            }
        })
        .collect()
}
