pub mod filter;
pub mod present;
pub mod repository;
pub mod service;
pub mod types;

pub use filter::{FilterSpec, RawFilterParams};
pub use repository::{ReportRepository, SqliteReportRepository};
pub use service::{PreviewResponse, ReportService};
pub use types::{CellRecord, SummaryStats};
