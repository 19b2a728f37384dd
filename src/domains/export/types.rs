use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domains::export::writer::WriterError;
use crate::errors::DomainError;

/// Export job lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// One asynchronous export job tracked through its lifecycle.
///
/// Created as `{Pending, progress 0}` atomically with registry insertion.
/// Progress is non-decreasing; once the state is terminal the task is
/// immutable. On success `artifact_path` is set and `error` is not; on
/// failure the reverse. Never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportTask {
    pub id: Uuid,
    pub state: TaskState,
    pub progress: u8,
    pub error: Option<String>,
    pub artifact_path: Option<PathBuf>,
    pub requested_at: DateTime<Utc>,
}

impl ExportTask {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            state: TaskState::Pending,
            progress: 0,
            error: None,
            artifact_path: None,
            requested_at: Utc::now(),
        }
    }

    pub fn done(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Poller-facing snapshot of a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub progress: u8,
    pub done: bool,
    pub error: Option<String>,
}

impl From<&ExportTask> for TaskStatus {
    fn from(task: &ExportTask) -> Self {
        Self {
            progress: task.progress,
            done: task.done(),
            error: task.error.clone(),
        }
    }
}

/// Errors occurring inside a running export. Never propagated to the
/// dispatching caller; absorbed into task state by the worker.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("query failed: {0}")]
    Query(#[from] DomainError),

    #[error("writer error: {0}")]
    Writer(#[from] WriterError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_to_poll_shape() {
        let mut task = ExportTask::new(Uuid::new_v4());
        task.state = TaskState::Failed;
        task.progress = 100;
        task.error = Some("disk full".to_string());

        let json = serde_json::to_value(TaskStatus::from(&task)).unwrap();
        assert_eq!(json["progress"], 100);
        assert_eq!(json["done"], true);
        assert_eq!(json["error"], "disk full");
    }

    #[test]
    fn test_in_flight_status_has_null_error() {
        let mut task = ExportTask::new(Uuid::new_v4());
        task.state = TaskState::Running;
        task.progress = 40;

        let json = serde_json::to_value(TaskStatus::from(&task)).unwrap();
        assert_eq!(json["progress"], 40);
        assert_eq!(json["done"], false);
        assert!(json["error"].is_null());
    }
}
