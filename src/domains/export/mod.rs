pub mod registry;
pub mod service;
pub mod sheet;
pub mod types;
pub mod writer;

mod worker;

pub use registry::TaskRegistry;
pub use service::{ExportConfig, ExportService};
pub use types::{ExportTask, TaskState, TaskStatus};
