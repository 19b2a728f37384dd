//! Core library for the production line cell report dashboard.
//!
//! Provides the filtered report queries, summary aggregates and paginated
//! previews backing the dashboard UI, plus the asynchronous export pipeline
//! that streams full result sets into downloadable spreadsheet artifacts.

pub mod database;
pub mod domains;
pub mod errors;
pub mod types;

pub use database::{init_pool, run_migrations};
pub use domains::export::{ExportConfig, ExportService, TaskStatus};
pub use domains::report::{RawFilterParams, ReportService, SqliteReportRepository};
pub use errors::{DbError, DomainError, ServiceError};
pub use types::{PaginatedResult, PaginationParams};
