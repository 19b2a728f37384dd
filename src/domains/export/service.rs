use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::domains::export::registry::TaskRegistry;
use crate::domains::export::types::TaskStatus;
use crate::domains::export::worker;
use crate::domains::export::writer::CsvArtifactWriter;
use crate::domains::report::filter::{FilterSpec, RawFilterParams};
use crate::domains::report::repository::ReportRepository;
use crate::errors::{ServiceError, ServiceResult};

const DEFAULT_BATCH_SIZE: i64 = 5000;
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Tuning knobs for the export pipeline.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Directory artifacts are written into.
    pub artifact_dir: PathBuf,
    /// Rows fetched per query while streaming an export.
    pub batch_size: i64,
    /// Upper bound on exports running at once; further requests are
    /// accepted immediately and wait in line.
    pub max_concurrent: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            artifact_dir: std::env::temp_dir(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl ExportConfig {
    /// Read overrides from the environment, falling back to defaults.
    /// Recognizes `LINE_REPORT_ARTIFACT_DIR`, `LINE_REPORT_BATCH_SIZE` and
    /// `LINE_REPORT_MAX_CONCURRENT`.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        let artifact_dir = std::env::var("LINE_REPORT_ARTIFACT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.artifact_dir);
        let batch_size = std::env::var("LINE_REPORT_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v: &i64| *v > 0)
            .unwrap_or(defaults.batch_size);
        let max_concurrent = std::env::var("LINE_REPORT_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v: &usize| *v > 0)
            .unwrap_or(defaults.max_concurrent);

        Self {
            artifact_dir,
            batch_size,
            max_concurrent,
        }
    }
}

/// Dispatches export jobs and answers status and download queries.
///
/// `start_export` validates synchronously, registers the task and returns;
/// the heavy work runs on a spawned tokio task gated by a semaphore so a
/// burst of requests cannot fan out into unbounded concurrent queries.
pub struct ExportService {
    repo: Arc<dyn ReportRepository>,
    registry: Arc<TaskRegistry>,
    limiter: Arc<Semaphore>,
    config: ExportConfig,
}

impl ExportService {
    pub fn new(repo: Arc<dyn ReportRepository>, config: ExportConfig) -> Self {
        Self {
            repo,
            registry: Arc::new(TaskRegistry::new()),
            limiter: Arc::new(Semaphore::new(config.max_concurrent)),
            config,
        }
    }

    /// Kick off an export for the given filter and return the task id.
    ///
    /// Filter validation happens before a task is registered, so a bad
    /// request fails here with no task left behind to poll.
    pub fn start_export(&self, raw: &RawFilterParams) -> ServiceResult<Uuid> {
        let filter = FilterSpec::from_raw(raw)?;

        let task_id = self.registry.create();
        let artifact_path = self
            .config
            .artifact_dir
            .join(format!("cell_report_{}.csv", task_id.simple()));

        let repo = Arc::clone(&self.repo);
        let registry = Arc::clone(&self.registry);
        let limiter = Arc::clone(&self.limiter);
        let batch_size = self.config.batch_size;

        tokio::spawn(async move {
            // Semaphore is never closed, so acquisition cannot fail.
            let _permit = limiter
                .acquire_owned()
                .await
                .expect("export limiter closed");

            registry.mark_running(task_id);
            let writer = match CsvArtifactWriter::create(&artifact_path) {
                Ok(w) => Box::new(w),
                Err(e) => {
                    log::error!("Export task {} could not open artifact: {}", task_id, e);
                    registry.fail(task_id, e.to_string());
                    return;
                }
            };

            worker::run(repo, registry, writer, task_id, filter, batch_size).await;
        });

        Ok(task_id)
    }

    /// Non-blocking status poll.
    pub fn status(&self, id: Uuid) -> ServiceResult<TaskStatus> {
        self.registry
            .status(id)
            .ok_or(ServiceError::TaskNotFound(id))
    }

    /// Resolve the artifact path of a finished export. A task that is still
    /// in flight is distinguished from one that never existed.
    pub fn download(&self, id: Uuid) -> ServiceResult<PathBuf> {
        let task = self
            .registry
            .get(id)
            .ok_or(ServiceError::TaskNotFound(id))?;

        match task.artifact_path {
            Some(path) if task.done() => Ok(path),
            _ => Err(ServiceError::ArtifactNotReady(id)),
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.batch_size, 5000);
        assert_eq!(config.max_concurrent, 4);
    }
}
