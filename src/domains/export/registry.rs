use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use uuid::Uuid;

use crate::domains::export::types::{ExportTask, TaskState, TaskStatus};

/// Shared task table for export jobs.
///
/// Owned by the export service and handed to workers as `Arc<TaskRegistry>`,
/// so its lifetime is explicit and separate instances never share state.
/// All operations take the lock briefly and never block on I/O, which keeps
/// status polling cheap even while exports are running.
///
/// Lifecycle rules enforced here rather than trusted to callers:
/// progress never decreases, and a task in a terminal state is immutable.
pub struct TaskRegistry {
    tasks: RwLock<HashMap<Uuid, ExportTask>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a fresh `{Pending, progress 0}` task and return its id. The
    /// insertion happens under the lock, so a poller can never observe the
    /// id before the task exists.
    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let task = ExportTask::new(id);
        self.tasks
            .write()
            .expect("task registry lock poisoned")
            .insert(id, task);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<ExportTask> {
        self.tasks
            .read()
            .expect("task registry lock poisoned")
            .get(&id)
            .cloned()
    }

    pub fn status(&self, id: Uuid) -> Option<TaskStatus> {
        self.tasks
            .read()
            .expect("task registry lock poisoned")
            .get(&id)
            .map(TaskStatus::from)
    }

    pub fn mark_running(&self, id: Uuid) {
        let mut tasks = self.tasks.write().expect("task registry lock poisoned");
        if let Some(task) = tasks.get_mut(&id) {
            if task.state == TaskState::Pending {
                task.state = TaskState::Running;
            }
        }
    }

    /// Update progress. Values below the current one are clamped so polls
    /// never observe a regression; terminal tasks are left untouched.
    pub fn set_progress(&self, id: Uuid, progress: u8) {
        let mut tasks = self.tasks.write().expect("task registry lock poisoned");
        if let Some(task) = tasks.get_mut(&id) {
            if !task.done() && progress > task.progress {
                task.progress = progress.min(100);
            }
        }
    }

    /// Terminal success: progress jumps to exactly 100 and the artifact path
    /// becomes visible in the same lock acquisition.
    pub fn complete(&self, id: Uuid, artifact_path: PathBuf) {
        let mut tasks = self.tasks.write().expect("task registry lock poisoned");
        if let Some(task) = tasks.get_mut(&id) {
            if !task.done() {
                task.state = TaskState::Succeeded;
                task.progress = 100;
                task.artifact_path = Some(artifact_path);
            }
        }
    }

    /// Terminal failure: progress still ends at 100 so pollers stop, and no
    /// artifact path is ever set.
    pub fn fail(&self, id: Uuid, message: impl Into<String>) {
        let mut tasks = self.tasks.write().expect("task registry lock poisoned");
        if let Some(task) = tasks.get_mut(&id) {
            if !task.done() {
                task.state = TaskState::Failed;
                task.progress = 100;
                task.error = Some(message.into());
            }
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks
            .read()
            .expect("task registry lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.task_count() == 0
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_starts_pending_at_zero() {
        let registry = TaskRegistry::new();
        let id = registry.create();

        let task = registry.get(id).unwrap();
        assert_eq!(task.state, TaskState::Pending);
        assert_eq!(task.progress, 0);
        assert!(task.error.is_none());
        assert!(task.artifact_path.is_none());
    }

    #[test]
    fn test_progress_never_decreases() {
        let registry = TaskRegistry::new();
        let id = registry.create();
        registry.mark_running(id);

        registry.set_progress(id, 40);
        registry.set_progress(id, 20);
        assert_eq!(registry.status(id).unwrap().progress, 40);

        registry.set_progress(id, 99);
        assert_eq!(registry.status(id).unwrap().progress, 99);
    }

    #[test]
    fn test_terminal_task_is_immutable() {
        let registry = TaskRegistry::new();
        let id = registry.create();
        registry.complete(id, PathBuf::from("/tmp/a.csv"));

        registry.set_progress(id, 10);
        registry.fail(id, "late failure");

        let task = registry.get(id).unwrap();
        assert_eq!(task.state, TaskState::Succeeded);
        assert_eq!(task.progress, 100);
        assert!(task.error.is_none());
        assert_eq!(task.artifact_path, Some(PathBuf::from("/tmp/a.csv")));
    }

    #[test]
    fn test_failure_sets_error_without_artifact() {
        let registry = TaskRegistry::new();
        let id = registry.create();
        registry.mark_running(id);
        registry.fail(id, "disk full");

        let task = registry.get(id).unwrap();
        assert_eq!(task.state, TaskState::Failed);
        assert_eq!(task.progress, 100);
        assert_eq!(task.error.as_deref(), Some("disk full"));
        assert!(task.artifact_path.is_none());

        let status = registry.status(id).unwrap();
        assert!(status.done);
    }

    #[test]
    fn test_unknown_id_yields_none() {
        let registry = TaskRegistry::new();
        assert!(registry.status(Uuid::new_v4()).is_none());
        assert!(registry.get(Uuid::new_v4()).is_none());
    }
}
