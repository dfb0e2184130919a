//! Code for writing forecast results to CSV files.
use crate::forecast::ForecastReport;
use anyhow::{Context, Result, ensure};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which forecast results are saved
pub const OUTPUT_DIRECTORY_ROOT: &str = "surgecast_results";

/// The output file name for the daily surge outlook
const DAILY_OUTLOOK_FILE_NAME: &str = "daily_outlook.csv";

/// The output file name for the per-facility procurement plan
const PROCUREMENT_FILE_NAME: &str = "procurement_plan.csv";

/// The output file name for the per-facility staffing plan
const STAFFING_FILE_NAME: &str = "staffing_plan.csv";

/// The output file name for the preparation timeline
const TIMELINE_FILE_NAME: &str = "timeline.csv";

/// The output file name for the pooled network view
const NETWORK_FILE_NAME: &str = "network_plan.csv";

/// The output file name for the per-facility summary
const SUMMARY_FILE_NAME: &str = "facility_summary.csv";

/// Get the output directory for the given model.
///
/// The results land in a subfolder of [`OUTPUT_DIRECTORY_ROOT`] named after the model folder.
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise so a trailing slash doesn't yield an empty model name
    let model_dir = model_dir
        .canonicalize()
        .with_context(|| format!("Could not resolve path {}", model_dir.display()))?;
    let model_name = model_dir
        .file_name()
        .context("Could not resolve model name")?;

    Ok(Path::new(OUTPUT_DIRECTORY_ROOT).join(model_name))
}

/// Create a directory for output files.
///
/// If the directory already exists it is only replaced when `overwrite` is set; the return
/// value says whether an existing directory was replaced.
pub fn create_output_directory(output_dir: &Path, overwrite: bool) -> Result<bool> {
    let existed = output_dir.exists();
    if existed {
        ensure!(
            overwrite,
            "Output directory {} already exists. Use --overwrite to replace it.",
            output_dir.display()
        );
        fs::remove_dir_all(output_dir)
            .with_context(|| format!("Could not remove {}", output_dir.display()))?;
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Could not create {}", output_dir.display()))?;

    Ok(existed)
}

#[derive(Serialize)]
struct DailyOutlookRow<'a> {
    date: NaiveDate,
    multiplier: f64,
    severity: &'a crate::surge::Severity,
    risk_factors: String,
    narrative: &'a str,
}

#[derive(Serialize)]
struct ProcurementRow<'a> {
    facility_id: &'a crate::facility::FacilityID,
    item_id: &'a crate::supply::ItemID,
    required: u64,
    projected_need: u64,
    current_stock: u64,
    to_order: u64,
    stock_percentage: f64,
    status: crate::procurement::StockStatus,
    priority_score: f64,
    lead_time_days: u32,
    delivery_possible: bool,
    order_immediately: bool,
}

#[derive(Serialize)]
struct StaffingRow<'a> {
    facility_id: &'a crate::facility::FacilityID,
    role: crate::resources::StaffRole,
    required: u32,
    available: u32,
    additional_needed: u32,
}

#[derive(Serialize)]
struct TimelineRow<'a> {
    facility_id: &'a crate::facility::FacilityID,
    date: NaiveDate,
    days_from_now: u32,
    action: &'a str,
    quantity: u64,
    priority: crate::timeline::ActionPriority,
    category: crate::timeline::ActionCategory,
}

#[derive(Serialize)]
struct NetworkRow<'a> {
    item_id: &'a crate::supply::ItemID,
    total_required: u64,
    total_available: u64,
    transferable_units: u64,
    procurement_needed: u64,
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    facility_id: &'a crate::facility::FacilityID,
    name: &'a str,
    class: crate::facility::FacilityClass,
    predicted_admissions: u32,
    beds_needed: u32,
    readiness: f64,
}

fn write_csv<T: Serialize>(file_path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = csv::Writer::from_path(file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Error writing {}", file_path.display()))?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the forecast report to CSV files in the specified directory.
///
/// # Arguments
///
/// * `output_dir` - Folder in which the files are created
/// * `report` - The forecast report to write
pub fn write_report(output_dir: &Path, report: &ForecastReport) -> Result<()> {
    write_csv(
        &output_dir.join(DAILY_OUTLOOK_FILE_NAME),
        report.daily.iter().map(|assessment| DailyOutlookRow {
            date: assessment.date,
            multiplier: assessment.multiplier,
            severity: &assessment.severity,
            risk_factors: assessment.risk_factors.join("; "),
            narrative: &assessment.narrative,
        }),
    )?;

    write_csv(
        &output_dir.join(PROCUREMENT_FILE_NAME),
        report.facility_plans.iter().flat_map(|plan| {
            plan.procurement.iter().map(|item| ProcurementRow {
                facility_id: &plan.facility_id,
                item_id: &item.item_id,
                required: item.required,
                projected_need: item.projected_need,
                current_stock: item.current_stock,
                to_order: item.to_order,
                stock_percentage: item.stock_percentage,
                status: item.status,
                priority_score: item.priority_score,
                lead_time_days: item.lead_time_days,
                delivery_possible: item.delivery_possible,
                order_immediately: item.order_immediately,
            })
        }),
    )?;

    write_csv(
        &output_dir.join(STAFFING_FILE_NAME),
        report.facility_plans.iter().flat_map(|plan| {
            plan.staff.iter().map(|allocation| StaffingRow {
                facility_id: &plan.facility_id,
                role: allocation.role,
                required: allocation.required,
                available: allocation.available,
                additional_needed: allocation.additional_needed,
            })
        }),
    )?;

    write_csv(
        &output_dir.join(TIMELINE_FILE_NAME),
        report.facility_plans.iter().flat_map(|plan| {
            plan.timeline.iter().map(|entry| TimelineRow {
                facility_id: &plan.facility_id,
                date: entry.date,
                days_from_now: entry.days_from_now,
                action: &entry.action,
                quantity: entry.quantity,
                priority: entry.priority,
                category: entry.category,
            })
        }),
    )?;

    write_csv(
        &output_dir.join(NETWORK_FILE_NAME),
        report.network.total_requirements.iter().map(|(item, required)| {
            let transferable_units = report
                .network
                .pooling_opportunities
                .iter()
                .find(|opportunity| opportunity.item_id == *item)
                .map_or(0, |opportunity| opportunity.transferable_units);

            NetworkRow {
                item_id: item,
                total_required: *required,
                total_available: report.network.total_available[item],
                transferable_units,
                procurement_needed: report
                    .network
                    .procurement_needed
                    .get(item)
                    .copied()
                    .unwrap_or(0),
            }
        }),
    )?;

    write_csv(
        &output_dir.join(SUMMARY_FILE_NAME),
        report.facility_plans.iter().map(|plan| SummaryRow {
            facility_id: &plan.facility_id,
            name: &plan.name,
            class: plan.class,
            predicted_admissions: plan.predicted_admissions,
            beds_needed: plan.resources.beds_needed,
            readiness: plan.readiness,
        }),
    )?;

    Ok(())
}
