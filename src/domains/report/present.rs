//! Presentation formatting, applied after retrieval.
//!
//! This stage renders values for display only. Aggregates and exports read
//! the unformatted [`CellRecord`] values, so rounding here can never skew a
//! count or a summary.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domains::report::types::CellRecord;

/// Dashboard datetime rendering, e.g. `02 Jan 2024 10:20:30`.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%d %b %Y %H:%M:%S").to_string()
}

/// Measurements are shown with four decimal places.
pub fn format_measurement(value: f64) -> String {
    format!("{:.4}", value)
}

fn optional_measurement(value: Option<f64>) -> Option<String> {
    value.map(format_measurement)
}

/// One preview table row, with display formatting applied.
#[derive(Debug, Clone, Serialize)]
pub struct CellRecordView {
    pub row_num: u64,
    pub date_time: String,
    pub shift: String,
    pub operator: String,
    pub cell_position: Option<i64>,
    pub cell_barcode: String,
    pub barley_paper_positive: Option<String>,
    pub barley_paper_negative: Option<String>,
    pub barley_paper_status: i64,
    pub capacity_min_set: Option<String>,
    pub capacity_max_set: Option<String>,
    pub capacity_actual: Option<String>,
    pub capacity_status: i64,
    pub voltage_min_set: Option<String>,
    pub voltage_max_set: Option<String>,
    pub voltage_actual: Option<String>,
    pub resistance_min_set: Option<String>,
    pub resistance_max_set: Option<String>,
    pub resistance_actual: Option<String>,
    pub measurement_status: i64,
    pub final_status: i64,
    pub grade: i64,
    pub fail_reason: Option<String>,
}

/// Render a record for the preview table. `row_num` is the 1-based absolute
/// position of the row in the full filtered result set.
pub fn view(record: &CellRecord, row_num: u64) -> CellRecordView {
    CellRecordView {
        row_num,
        date_time: format_timestamp(&record.date_time),
        shift: record.shift.clone(),
        operator: record.operator.clone(),
        cell_position: record.cell_position,
        cell_barcode: record.cell_barcode.clone(),
        barley_paper_positive: optional_measurement(record.barley_paper_positive),
        barley_paper_negative: optional_measurement(record.barley_paper_negative),
        barley_paper_status: record.barley_paper_status,
        capacity_min_set: optional_measurement(record.capacity_min_set),
        capacity_max_set: optional_measurement(record.capacity_max_set),
        capacity_actual: optional_measurement(record.capacity_actual),
        capacity_status: record.capacity_status,
        voltage_min_set: optional_measurement(record.voltage_min_set),
        voltage_max_set: optional_measurement(record.voltage_max_set),
        voltage_actual: optional_measurement(record.voltage_actual),
        resistance_min_set: optional_measurement(record.resistance_min_set),
        resistance_max_set: optional_measurement(record.resistance_max_set),
        resistance_actual: optional_measurement(record.resistance_actual),
        measurement_status: record.measurement_status,
        final_status: record.final_status,
        grade: record.grade,
        fail_reason: record.fail_reason.clone(),
    }
}
