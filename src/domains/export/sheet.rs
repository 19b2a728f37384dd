use crate::domains::report::types::CellRecord;

/// Trait for types that can be written into an export sheet.
pub trait SheetRecord {
    /// Column headers, in row order.
    fn headers() -> Vec<&'static str>;

    /// Project this record into one sheet row.
    fn to_row(&self) -> Vec<String>;
}

pub fn sheet_optional<T: std::fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// Round a measurement for the export sheet. Rounding lives in the sheet
/// projection, not in the query layer, so aggregates stay exact.
pub fn sheet_rounded(value: &Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_default()
}

impl SheetRecord for CellRecord {
    fn headers() -> Vec<&'static str> {
        vec![
            "date_time",
            "shift",
            "operator",
            "cell_position",
            "cell_barcode",
            "barley_paper_positive",
            "barley_paper_negative",
            "barley_paper_status",
            "capacity_min_set",
            "capacity_max_set",
            "capacity_actual",
            "capacity_status",
            "voltage_min_set",
            "voltage_max_set",
            "voltage_actual",
            "resistance_min_set",
            "resistance_max_set",
            "resistance_actual",
            "measurement_status",
            "final_status",
            "grade",
            "fail_reason",
        ]
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            self.date_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            self.shift.clone(),
            self.operator.clone(),
            sheet_optional(&self.cell_position),
            self.cell_barcode.clone(),
            sheet_rounded(&self.barley_paper_positive, 4),
            sheet_rounded(&self.barley_paper_negative, 4),
            self.barley_paper_status.to_string(),
            sheet_rounded(&self.capacity_min_set, 3),
            sheet_rounded(&self.capacity_max_set, 3),
            sheet_rounded(&self.capacity_actual, 3),
            self.capacity_status.to_string(),
            sheet_rounded(&self.voltage_min_set, 4),
            sheet_rounded(&self.voltage_max_set, 4),
            sheet_rounded(&self.voltage_actual, 4),
            sheet_rounded(&self.resistance_min_set, 4),
            sheet_rounded(&self.resistance_max_set, 4),
            sheet_rounded(&self.resistance_actual, 4),
            self.measurement_status.to_string(),
            self.final_status.to_string(),
            self.grade.to_string(),
            sheet_optional(&self.fail_reason),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_width_matches_headers() {
        let record = CellRecord {
            id: 1,
            date_time: chrono::Utc::now(),
            shift: "A".to_string(),
            operator: "op".to_string(),
            cell_position: Some(3),
            cell_barcode: "CELL-1".to_string(),
            barley_paper_positive: None,
            barley_paper_negative: None,
            barley_paper_status: 1,
            capacity_min_set: Some(3.2),
            capacity_max_set: Some(3.4),
            capacity_actual: Some(3.34567),
            capacity_status: 1,
            voltage_min_set: None,
            voltage_max_set: None,
            voltage_actual: Some(3.70011),
            resistance_min_set: None,
            resistance_max_set: None,
            resistance_actual: None,
            measurement_status: 1,
            final_status: 1,
            grade: 2,
            fail_reason: None,
        };
        assert_eq!(record.to_row().len(), CellRecord::headers().len());
    }

    #[test]
    fn test_sheet_rounding() {
        assert_eq!(sheet_rounded(&Some(3.34567), 3), "3.346");
        assert_eq!(sheet_rounded(&Some(3.70011), 4), "3.7001");
        assert_eq!(sheet_rounded(&None, 4), "");
    }
}
