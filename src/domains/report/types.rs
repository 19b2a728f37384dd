use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::errors::{DomainError, DomainResult};

/// Canonical storage/bind rendering for timestamps.
///
/// Timestamps are stored as RFC 3339 TEXT with fixed millisecond precision
/// and a `Z` suffix, so lexicographic comparison in SQL matches chronological
/// order and range predicates stay correct.
pub fn storage_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_storage_timestamp(s: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::Internal(format!("Bad timestamp in cell_report row: {}", e)))
}

/// Row mapped 1:1 to the `cell_report` table.
#[derive(Debug, Clone, FromRow)]
pub struct CellReportRow {
    pub id: i64,
    pub date_time: String,
    pub shift: String,
    pub operator: String,
    pub cell_position: Option<i64>,
    pub cell_barcode: String,
    pub barley_paper_positive: Option<f64>,
    pub barley_paper_negative: Option<f64>,
    pub barley_paper_status: i64,
    pub capacity_min_set: Option<f64>,
    pub capacity_max_set: Option<f64>,
    pub capacity_actual: Option<f64>,
    pub capacity_status: i64,
    pub voltage_min_set: Option<f64>,
    pub voltage_max_set: Option<f64>,
    pub voltage_actual: Option<f64>,
    pub resistance_min_set: Option<f64>,
    pub resistance_max_set: Option<f64>,
    pub resistance_actual: Option<f64>,
    pub measurement_status: i64,
    pub final_status: i64,
    pub grade: i64,
    pub fail_reason: Option<String>,
}

impl CellReportRow {
    pub fn into_entity(self) -> DomainResult<CellRecord> {
        Ok(CellRecord {
            id: self.id,
            date_time: parse_storage_timestamp(&self.date_time)?,
            shift: self.shift,
            operator: self.operator,
            cell_position: self.cell_position,
            cell_barcode: self.cell_barcode,
            barley_paper_positive: self.barley_paper_positive,
            barley_paper_negative: self.barley_paper_negative,
            barley_paper_status: self.barley_paper_status,
            capacity_min_set: self.capacity_min_set,
            capacity_max_set: self.capacity_max_set,
            capacity_actual: self.capacity_actual,
            capacity_status: self.capacity_status,
            voltage_min_set: self.voltage_min_set,
            voltage_max_set: self.voltage_max_set,
            voltage_actual: self.voltage_actual,
            resistance_min_set: self.resistance_min_set,
            resistance_max_set: self.resistance_max_set,
            resistance_actual: self.resistance_actual,
            measurement_status: self.measurement_status,
            final_status: self.final_status,
            grade: self.grade,
            fail_reason: self.fail_reason,
        })
    }
}

/// One cell test result, as handed out by the query layer.
///
/// Values here are formatting-free; presentation rendering lives in
/// `present` and never feeds back into aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellRecord {
    pub id: i64,
    pub date_time: DateTime<Utc>,
    pub shift: String,
    pub operator: String,
    pub cell_position: Option<i64>,
    pub cell_barcode: String,
    pub barley_paper_positive: Option<f64>,
    pub barley_paper_negative: Option<f64>,
    pub barley_paper_status: i64,
    pub capacity_min_set: Option<f64>,
    pub capacity_max_set: Option<f64>,
    pub capacity_actual: Option<f64>,
    pub capacity_status: i64,
    pub voltage_min_set: Option<f64>,
    pub voltage_max_set: Option<f64>,
    pub voltage_actual: Option<f64>,
    pub resistance_min_set: Option<f64>,
    pub resistance_max_set: Option<f64>,
    pub resistance_actual: Option<f64>,
    pub measurement_status: i64,
    pub final_status: i64,
    pub grade: i64,
    pub fail_reason: Option<String>,
}

/// Pass counts broken down by assigned grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassByGrade {
    pub g1: i64,
    pub g2: i64,
    pub g3: i64,
    pub g4: i64,
    pub g5: i64,
    pub g6: i64,
}

/// Fail counts broken down by the recorded fail reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailByCause {
    pub barcode: i64,
    pub voltage: i64,
    pub resistance: i64,
    pub voltage_and_resistance: i64,
    pub capacity: i64,
    pub barley_paper: i64,
    pub duplicate: i64,
}

/// Aggregate counts over the entire filtered set, computed by a single
/// aggregate query independent of any row window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total: i64,
    pub pass: i64,
    pub fail: i64,
    pub pass_by_grade: PassByGrade,
    pub fail_by_cause: FailByCause,
}

/// Row shape of the aggregate stats query.
#[derive(Debug, FromRow)]
pub struct SummaryStatsRow {
    pub total: i64,
    pub pass: i64,
    pub fail: i64,
    pub pass_g1: i64,
    pub pass_g2: i64,
    pub pass_g3: i64,
    pub pass_g4: i64,
    pub pass_g5: i64,
    pub pass_g6: i64,
    pub ng_barcode: i64,
    pub ng_voltage: i64,
    pub ng_resistance: i64,
    pub ng_voltage_resistance: i64,
    pub ng_capacity: i64,
    pub ng_barley_paper: i64,
    pub ng_duplicate: i64,
}

impl SummaryStatsRow {
    pub fn into_stats(self) -> SummaryStats {
        SummaryStats {
            total: self.total,
            pass: self.pass,
            fail: self.fail,
            pass_by_grade: PassByGrade {
                g1: self.pass_g1,
                g2: self.pass_g2,
                g3: self.pass_g3,
                g4: self.pass_g4,
                g5: self.pass_g5,
                g6: self.pass_g6,
            },
            fail_by_cause: FailByCause {
                barcode: self.ng_barcode,
                voltage: self.ng_voltage,
                resistance: self.ng_resistance,
                voltage_and_resistance: self.ng_voltage_resistance,
                capacity: self.ng_capacity,
                barley_paper: self.ng_barley_paper,
                duplicate: self.ng_duplicate,
            },
        }
    }
}
