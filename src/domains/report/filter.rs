use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::report::types::storage_timestamp;
use crate::errors::{DomainError, DomainResult};

/// Accepted input date formats, tried in order. First successful parse wins.
pub const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d",
];

/// Parse a user-supplied date string against [`DATE_FORMATS`].
///
/// Naive inputs are interpreted as UTC. Fails with `InvalidDateFormat` when
/// nothing matches; callers must treat empty input as "absent" before calling.
pub fn parse_report_date(input: &str) -> DomainResult<DateTime<Utc>> {
    let s = input.trim();
    for fmt in DATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&dt));
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            // Date-only formats resolve to midnight.
            return Ok(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0).unwrap_or_default()));
        }
    }
    Err(DomainError::InvalidDateFormat(input.to_string()))
}

/// Loosely-typed filter parameters as they arrive from the UI layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFilterParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub barcode: Option<String>,
    pub barley_status: Option<String>,
    pub capacity_status: Option<String>,
    pub measurement_status: Option<String>,
    pub final_status: Option<String>,
    pub grade: Option<String>,
}

/// Enumerated status/grade columns accepted for exact-match constraints.
///
/// This is the allow-list: column identifiers in generated SQL come only
/// from here, never from request input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusField {
    BarleyPaperStatus,
    CapacityStatus,
    MeasurementStatus,
    FinalStatus,
    Grade,
}

impl StatusField {
    pub fn column(&self) -> &'static str {
        match self {
            StatusField::BarleyPaperStatus => "barley_paper_status",
            StatusField::CapacityStatus => "capacity_status",
            StatusField::MeasurementStatus => "measurement_status",
            StatusField::FinalStatus => "final_status",
            StatusField::Grade => "grade",
        }
    }
}

/// A value destined for a bound `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
}

/// Normalized, validated filter intent. Built once per request and shared
/// verbatim between the preview and export paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub barcode_contains: Option<String>,
    pub exact: Vec<(StatusField, i64)>,
}

impl FilterSpec {
    /// Validate and normalize raw request parameters.
    ///
    /// All rejections happen here, synchronously, before any query runs or
    /// any export task is created.
    pub fn from_raw(raw: &RawFilterParams) -> DomainResult<Self> {
        let start = parse_optional_date(&raw.start_date)?;
        let end = parse_optional_date(&raw.end_date)?;

        let barcode_contains = raw
            .barcode
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut exact = Vec::new();
        let candidates = [
            (StatusField::BarleyPaperStatus, &raw.barley_status),
            (StatusField::CapacityStatus, &raw.capacity_status),
            (StatusField::MeasurementStatus, &raw.measurement_status),
            (StatusField::FinalStatus, &raw.final_status),
            (StatusField::Grade, &raw.grade),
        ];
        for (field, value) in candidates {
            if let Some(raw_value) = value.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                let parsed = raw_value.parse::<i64>().map_err(|_| {
                    DomainError::invalid_filter_value(
                        field.column(),
                        format!("expected an integer, got {:?}", raw_value),
                    )
                })?;
                exact.push((field, parsed));
            }
        }

        Ok(Self {
            start,
            end,
            barcode_contains,
            exact,
        })
    }

    /// Render this spec as an ordered AND predicate plus its bound values.
    pub fn predicate(&self) -> Predicate {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        // One-sided ranges become open-ended bounds. The source dashboard
        // dropped the date filter entirely unless both ends were present,
        // which silently returned unfiltered data.
        if let Some(start) = &self.start {
            clauses.push("date_time >= ?".to_string());
            params.push(SqlParam::Text(storage_timestamp(start)));
        }
        if let Some(end) = &self.end {
            clauses.push("date_time <= ?".to_string());
            params.push(SqlParam::Text(storage_timestamp(end)));
        }
        if let Some(needle) = &self.barcode_contains {
            clauses.push(r"LOWER(cell_barcode) LIKE ? ESCAPE '\'".to_string());
            params.push(SqlParam::Text(format!("%{}%", escape_like(needle))));
        }
        for (field, value) in &self.exact {
            clauses.push(format!("{} = ?", field.column()));
            params.push(SqlParam::Int(*value));
        }

        Predicate { clauses, params }
    }
}

/// Escape LIKE metacharacters so the needle matches literally. `%` and `_`
/// in a barcode filter are data, not wildcards.
fn escape_like(s: &str) -> String {
    s.replace('\\', r"\\").replace('%', r"\%").replace('_', r"\_")
}

fn parse_optional_date(value: &Option<String>) -> DomainResult<Option<DateTime<Utc>>> {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => parse_report_date(s).map(Some),
        _ => Ok(None),
    }
}

/// Ordered list of clause fragments ANDed together, with the matching bound
/// parameter values in clause order.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    clauses: Vec<String>,
    params: Vec<SqlParam>,
}

impl Predicate {
    /// The WHERE body. Defaults to an always-true clause when unconstrained.
    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            "1=1".to_string()
        } else {
            self.clauses.join(" AND ")
        }
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn raw() -> RawFilterParams {
        RawFilterParams::default()
    }

    #[test]
    fn test_every_accepted_date_format_parses() {
        let inputs = [
            "2024-01-02 10:20:30.500",
            "2024-01-02 10:20:30",
            "2024-01-02T10:20:30.500",
            "2024-01-02T10:20:30",
            "2024-01-02 10:20",
            "2024-01-02T10:20",
            "2024-01-02",
        ];
        for input in inputs {
            let parsed = parse_report_date(input);
            assert!(parsed.is_ok(), "{input} should parse: {parsed:?}");
        }
        // Date-only resolves to midnight.
        let midnight = parse_report_date("2024-01-02").unwrap();
        assert_eq!((midnight.hour(), midnight.minute()), (0, 0));
    }

    #[test]
    fn test_unparsable_date_is_rejected() {
        let err = parse_report_date("not-a-date").unwrap_err();
        assert!(matches!(err, DomainError::InvalidDateFormat(_)));

        let mut params = raw();
        params.start_date = Some("not-a-date".to_string());
        assert!(matches!(
            FilterSpec::from_raw(&params),
            Err(DomainError::InvalidDateFormat(_))
        ));
    }

    #[test]
    fn test_empty_filter_is_always_true() {
        let spec = FilterSpec::from_raw(&raw()).unwrap();
        let pred = spec.predicate();
        assert_eq!(pred.where_sql(), "1=1");
        assert!(pred.params().is_empty());
    }

    #[test]
    fn test_one_sided_range_becomes_open_ended_bound() {
        let mut params = raw();
        params.start_date = Some("2024-01-01".to_string());
        let spec = FilterSpec::from_raw(&params).unwrap();
        assert!(spec.start.is_some());
        assert!(spec.end.is_none());

        let pred = spec.predicate();
        assert_eq!(pred.where_sql(), "date_time >= ?");
        assert_eq!(pred.params().len(), 1);
    }

    #[test]
    fn test_two_sided_range_binds_both_ends() {
        let mut params = raw();
        params.start_date = Some("2024-01-01".to_string());
        params.end_date = Some("2024-01-02 23:59:59".to_string());
        let pred = FilterSpec::from_raw(&params).unwrap().predicate();
        assert_eq!(pred.where_sql(), "date_time >= ? AND date_time <= ?");
        assert_eq!(pred.params().len(), 2);
    }

    #[test]
    fn test_whitespace_barcode_is_absent() {
        let mut params = raw();
        params.barcode = Some("   ".to_string());
        let spec = FilterSpec::from_raw(&params).unwrap();
        assert!(spec.barcode_contains.is_none());
    }

    #[test]
    fn test_barcode_is_lowercased_contains_pattern() {
        let mut params = raw();
        params.barcode = Some("  CELL-42  ".to_string());
        let spec = FilterSpec::from_raw(&params).unwrap();
        assert_eq!(spec.barcode_contains.as_deref(), Some("cell-42"));

        let pred = spec.predicate();
        assert_eq!(pred.where_sql(), r"LOWER(cell_barcode) LIKE ? ESCAPE '\'");
        assert_eq!(pred.params(), &[SqlParam::Text("%cell-42%".to_string())]);
    }

    #[test]
    fn test_barcode_wildcards_match_literally() {
        let mut params = raw();
        params.barcode = Some("10%_A".to_string());
        let pred = FilterSpec::from_raw(&params).unwrap().predicate();
        assert_eq!(
            pred.params(),
            &[SqlParam::Text(r"%10\%\_a%".to_string())]
        );
    }

    #[test]
    fn test_exact_fields_accept_empty_as_unset() {
        let mut params = raw();
        params.final_status = Some(String::new());
        params.grade = Some(" ".to_string());
        let spec = FilterSpec::from_raw(&params).unwrap();
        assert!(spec.exact.is_empty());
    }

    #[test]
    fn test_exact_fields_must_be_integers() {
        let mut params = raw();
        params.grade = Some("two".to_string());
        let err = FilterSpec::from_raw(&params).unwrap_err();
        assert!(matches!(err, DomainError::InvalidFilterValue { ref field, .. } if field == "grade"));
    }

    #[test]
    fn test_clause_order_matches_param_order() {
        let mut params = raw();
        params.start_date = Some("2024-01-01".to_string());
        params.end_date = Some("2024-01-31".to_string());
        params.barcode = Some("abc".to_string());
        params.final_status = Some("1".to_string());
        params.grade = Some("3".to_string());

        let pred = FilterSpec::from_raw(&params).unwrap().predicate();
        assert_eq!(
            pred.where_sql(),
            r"date_time >= ? AND date_time <= ? AND LOWER(cell_barcode) LIKE ? ESCAPE '\' AND final_status = ? AND grade = ?"
        );
        assert_eq!(pred.params().len(), 5);
        assert_eq!(pred.params()[3], SqlParam::Int(1));
        assert_eq!(pred.params()[4], SqlParam::Int(3));
    }
}
