use async_trait::async_trait;
use sqlx::query::QueryAs;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{FromRow, Sqlite, SqlitePool};

use crate::domains::report::filter::{FilterSpec, SqlParam};
use crate::domains::report::types::{CellRecord, CellReportRow, SummaryStats, SummaryStatsRow};
use crate::errors::{DbError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams};

/// Read-side contract of the cell report data source.
///
/// Every method takes the same normalized [`FilterSpec`], so a count, a page
/// window, an export batch and the aggregate summary are guaranteed to agree
/// on which rows are in scope.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Total rows matched by the filter.
    async fn count_matching(&self, filter: &FilterSpec) -> DomainResult<i64>;

    /// One preview page plus the total count for pagination.
    async fn fetch_page(
        &self,
        filter: &FilterSpec,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<CellRecord>>;

    /// A raw offset/limit window, used by the export worker.
    async fn fetch_batch(
        &self,
        filter: &FilterSpec,
        offset: i64,
        limit: i64,
    ) -> DomainResult<Vec<CellRecord>>;

    /// Aggregate pass/fail statistics over the whole filtered set.
    async fn summary(&self, filter: &FilterSpec) -> DomainResult<SummaryStats>;
}

/// SQLite implementation of [`ReportRepository`].
#[derive(Debug, Clone)]
pub struct SqliteReportRepository {
    pool: SqlitePool,
}

/// Stable ordering key. `date_time` alone can tie under bursty writes, so the
/// row id breaks ties and keeps offset windows well defined.
const ORDER_BY: &str = "ORDER BY date_time ASC, id ASC";

impl SqliteReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn bind_filter<'q, O>(
        mut query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
        params: &[SqlParam],
    ) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>>
    where
        O: for<'r> FromRow<'r, SqliteRow>,
    {
        for param in params {
            query = match param {
                SqlParam::Int(v) => query.bind(*v),
                SqlParam::Text(s) => query.bind(s.clone()),
            };
        }
        query
    }
}

#[async_trait]
impl ReportRepository for SqliteReportRepository {
    async fn count_matching(&self, filter: &FilterSpec) -> DomainResult<i64> {
        let predicate = filter.predicate();
        let sql = format!(
            "SELECT COUNT(*) FROM cell_report WHERE {}",
            predicate.where_sql()
        );

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for param in predicate.params() {
            query = match param {
                SqlParam::Int(v) => query.bind(*v),
                SqlParam::Text(s) => query.bind(s.clone()),
            };
        }

        let total = query.fetch_one(&self.pool).await.map_err(DbError::from)?;
        Ok(total)
    }

    async fn fetch_page(
        &self,
        filter: &FilterSpec,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<CellRecord>> {
        let total = self.count_matching(filter).await?;
        let rows = self
            .fetch_batch(filter, params.offset(), params.per_page as i64)
            .await?;
        Ok(PaginatedResult::new(rows, total as u64, params))
    }

    async fn fetch_batch(
        &self,
        filter: &FilterSpec,
        offset: i64,
        limit: i64,
    ) -> DomainResult<Vec<CellRecord>> {
        let predicate = filter.predicate();
        let sql = format!(
            "SELECT * FROM cell_report WHERE {} {} LIMIT ? OFFSET ?",
            predicate.where_sql(),
            ORDER_BY
        );

        let query = Self::bind_filter(
            sqlx::query_as::<_, CellReportRow>(&sql),
            predicate.params(),
        )
        .bind(limit)
        .bind(offset);

        let rows = query.fetch_all(&self.pool).await.map_err(DbError::from)?;
        rows.into_iter()
            .map(CellReportRow::into_entity)
            .collect::<DomainResult<Vec<CellRecord>>>()
    }

    async fn summary(&self, filter: &FilterSpec) -> DomainResult<SummaryStats> {
        let predicate = filter.predicate();
        let sql = format!(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN final_status = 1 THEN 1 ELSE 0 END), 0) AS pass,
                COALESCE(SUM(CASE WHEN final_status = 0 THEN 1 ELSE 0 END), 0) AS fail,
                COALESCE(SUM(CASE WHEN final_status = 1 AND grade = 1 THEN 1 ELSE 0 END), 0) AS pass_g1,
                COALESCE(SUM(CASE WHEN final_status = 1 AND grade = 2 THEN 1 ELSE 0 END), 0) AS pass_g2,
                COALESCE(SUM(CASE WHEN final_status = 1 AND grade = 3 THEN 1 ELSE 0 END), 0) AS pass_g3,
                COALESCE(SUM(CASE WHEN final_status = 1 AND grade = 4 THEN 1 ELSE 0 END), 0) AS pass_g4,
                COALESCE(SUM(CASE WHEN final_status = 1 AND grade = 5 THEN 1 ELSE 0 END), 0) AS pass_g5,
                COALESCE(SUM(CASE WHEN final_status = 1 AND grade = 6 THEN 1 ELSE 0 END), 0) AS pass_g6,
                COALESCE(SUM(CASE WHEN LOWER(COALESCE(fail_reason, '')) LIKE '%barcode%' THEN 1 ELSE 0 END), 0) AS ng_barcode,
                COALESCE(SUM(CASE WHEN LOWER(COALESCE(fail_reason, '')) LIKE '%vtg%' AND LOWER(COALESCE(fail_reason, '')) NOT LIKE '%&%' THEN 1 ELSE 0 END), 0) AS ng_voltage,
                COALESCE(SUM(CASE WHEN LOWER(COALESCE(fail_reason, '')) LIKE '%ir%' AND LOWER(COALESCE(fail_reason, '')) NOT LIKE '%&%' THEN 1 ELSE 0 END), 0) AS ng_resistance,
                COALESCE(SUM(CASE WHEN LOWER(COALESCE(fail_reason, '')) LIKE '%vtg & ir%' THEN 1 ELSE 0 END), 0) AS ng_voltage_resistance,
                COALESCE(SUM(CASE WHEN LOWER(COALESCE(fail_reason, '')) LIKE '%capacity%' THEN 1 ELSE 0 END), 0) AS ng_capacity,
                COALESCE(SUM(CASE WHEN LOWER(COALESCE(fail_reason, '')) LIKE '%paper%' THEN 1 ELSE 0 END), 0) AS ng_barley_paper,
                COALESCE(SUM(CASE WHEN LOWER(COALESCE(fail_reason, '')) LIKE '%duplicate%' THEN 1 ELSE 0 END), 0) AS ng_duplicate
            FROM cell_report
            WHERE {}
            "#,
            predicate.where_sql()
        );

        let query = Self::bind_filter(
            sqlx::query_as::<_, SummaryStatsRow>(&sql),
            predicate.params(),
        );

        let row = query.fetch_one(&self.pool).await.map_err(DbError::from)?;
        Ok(row.into_stats())
    }
}
