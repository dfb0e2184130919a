//! The network-level resource pooling optimiser.
//!
//! Looks across facilities for items where one hospital's surplus can cover another's
//! shortage, and computes what the network as a whole still needs to procure after pooling.
use crate::facility::FacilityID;
use crate::supply::ItemID;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;

/// One facility's projected requirements and current availability, per item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityResourceSummary {
    /// The facility
    pub facility_id: FacilityID,
    /// Units needed per item, including the safety buffer
    pub required: IndexMap<ItemID, u64>,
    /// Units on hand per item
    pub available: IndexMap<ItemID, u64>,
}

impl FacilityResourceSummary {
    fn required_of(&self, item: &ItemID) -> u64 {
        self.required.get(item).copied().unwrap_or(0)
    }

    fn available_of(&self, item: &ItemID) -> u64 {
        self.available.get(item).copied().unwrap_or(0)
    }
}

/// An opportunity to move stock between facilities instead of buying more
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolingOpportunity {
    /// The supply item
    pub item_id: ItemID,
    /// Units that can be transferred from surplus to shortage facilities
    pub transferable_units: u64,
    /// Facilities holding more than they need
    pub surplus_facilities: Vec<FacilityID>,
    /// Facilities holding less than they need
    pub shortage_facilities: Vec<FacilityID>,
}

/// The network-wide view after pooling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkPlan {
    /// Total units needed per item across all facilities
    pub total_requirements: IndexMap<ItemID, u64>,
    /// Total units on hand per item across all facilities
    pub total_available: IndexMap<ItemID, u64>,
    /// Units the network must procure after exhausting transfers; only items with a genuine
    /// network-wide shortfall appear
    pub procurement_needed: IndexMap<ItemID, u64>,
    /// Transfer opportunities, in item order
    pub pooling_opportunities: Vec<PoolingOpportunity>,
}

/// Pool resources across the network.
///
/// Items are processed in order of first appearance across the facility summaries, so output
/// order is deterministic for a given model.
pub fn optimise(summaries: &[FacilityResourceSummary]) -> NetworkPlan {
    // Union of items, preserving first-appearance order
    let items = summaries
        .iter()
        .flat_map(|summary| summary.required.keys().chain(summary.available.keys()))
        .unique();

    let mut total_requirements = IndexMap::new();
    let mut total_available = IndexMap::new();
    let mut procurement_needed = IndexMap::new();
    let mut pooling_opportunities = Vec::new();

    for item in items {
        let mut required_sum = 0;
        let mut available_sum = 0;
        let mut surplus_sum = 0;
        let mut shortage_sum = 0;
        let mut surplus_facilities = Vec::new();
        let mut shortage_facilities = Vec::new();

        for summary in summaries {
            let required = summary.required_of(item);
            let available = summary.available_of(item);
            required_sum += required;
            available_sum += available;

            let surplus = available.saturating_sub(required);
            let shortage = required.saturating_sub(available);
            if surplus > 0 {
                surplus_sum += surplus;
                surplus_facilities.push(summary.facility_id.clone());
            }
            if shortage > 0 {
                shortage_sum += shortage;
                shortage_facilities.push(summary.facility_id.clone());
            }
        }

        total_requirements.insert(item.clone(), required_sum);
        total_available.insert(item.clone(), available_sum);

        let shortfall = required_sum.saturating_sub(available_sum);
        if shortfall > 0 {
            procurement_needed.insert(item.clone(), shortfall);
        }

        let transferable_units = surplus_sum.min(shortage_sum);
        if transferable_units > 0 {
            pooling_opportunities.push(PoolingOpportunity {
                item_id: item.clone(),
                transferable_units,
                surplus_facilities,
                shortage_facilities,
            });
        }
    }

    NetworkPlan {
        total_requirements,
        total_available,
        procurement_needed,
        pooling_opportunities,
    }
}
