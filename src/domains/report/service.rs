use std::sync::Arc;

use serde::Serialize;

use crate::domains::report::filter::{FilterSpec, RawFilterParams};
use crate::domains::report::present::{self, CellRecordView};
use crate::domains::report::repository::ReportRepository;
use crate::domains::report::types::SummaryStats;
use crate::errors::ServiceResult;
use crate::types::{PaginatedResult, PaginationParams};

/// Stats plus one page of display rows, as consumed by the dashboard table.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub stats: SummaryStats,
    pub rows: PaginatedResult<CellRecordView>,
}

/// The live, low-latency read path: same filter builder as the export path,
/// one aggregate query plus one count + one windowed row query.
pub struct ReportService {
    repo: Arc<dyn ReportRepository>,
}

impl ReportService {
    pub fn new(repo: Arc<dyn ReportRepository>) -> Self {
        Self { repo }
    }

    pub async fn preview(
        &self,
        raw: &RawFilterParams,
        params: PaginationParams,
    ) -> ServiceResult<PreviewResponse> {
        // Validation failures surface here, before any query runs.
        let filter = FilterSpec::from_raw(raw)?;

        let stats = self.repo.summary(&filter).await?;
        let page = self.repo.fetch_page(&filter, params).await?;

        let offset = params.offset() as u64;
        let mut row_num = offset;
        let rows = page.map(|record| {
            row_num += 1;
            present::view(&record, row_num)
        });

        Ok(PreviewResponse { stats, rows })
    }
}
