//! Task repository
//!
//! CRUD boundary between the views and the document backend. Validates input,
//! keeps the subtask/status invariant, stamps revisions and applies a timeout
//! to every remote call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::backend::DocumentBackend;
use super::document::{task_fields, task_from_document, TASK_FIELDS};
use super::model::{all_completed, clean_subtasks, NewTask, Subtask, Task, TaskPatch, TaskStatus};
use super::reconcile::next_revision;
use crate::{Error, Result};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Decide the status a task ends up with after `patch` is applied.
///
/// An explicit status wins, except that `done` with pending subtasks needs
/// `force_done`. Without one, a subtask edit completes the task when every
/// subtask is done and resets a done task to `todo` otherwise.
pub fn resolve_status(current: &Task, patch: &TaskPatch, subtasks: &[Subtask]) -> Result<TaskStatus> {
    let pending = subtasks.iter().any(|st| !st.completed);
    match patch.status {
        Some(TaskStatus::Done) if pending && !patch.force_done => {
            Err(Error::PendingSubtasks(current.id.clone()))
        }
        Some(status) => Ok(status),
        None if patch.subtasks.is_some() => {
            if all_completed(subtasks) {
                Ok(TaskStatus::Done)
            } else if current.status.is_done() {
                Ok(TaskStatus::Todo)
            } else {
                Ok(current.status)
            }
        }
        None => Ok(current.status),
    }
}

fn require_user(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(Error::Unauthenticated);
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("title", "Title cannot be empty"));
    }
    Ok(trimmed.to_string())
}

/// Handle for a live task-list subscription.
///
/// Dropping the handle also stops the listener.
pub struct Subscription {
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Validated CRUD over a [`DocumentBackend`].
///
/// Read-modify-write sequences (updates, toggles, board moves) hold a
/// repository-wide write lock, so concurrent edits of one task never lose
/// each other's changes. Clones share the lock.
#[derive(Clone)]
pub struct TaskRepository {
    backend: Arc<dyn DocumentBackend>,
    timeout: Duration,
    write_lock: Arc<Mutex<()>>,
}

impl TaskRepository {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn call<T>(&self, op: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!("Task {} failed: {}", op, e);
                Err(e)
            }
            Err(_) => {
                error!("Task {} timed out after {:?}", op, self.timeout);
                Err(Error::Timeout(self.timeout))
            }
        }
    }

    /// All tasks owned by `user_id`
    pub async fn list_tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>> {
        require_user(user_id)?;
        let documents = self
            .call("list", self.backend.query_by_owner(user_id))
            .await?;
        let tasks = documents
            .iter()
            .map(task_from_document)
            .collect::<Result<Vec<_>>>()
            .inspect_err(|e| error!("Failed to decode tasks for {}: {}", user_id, e))?;
        debug!("Loaded {} tasks for {}", tasks.len(), user_id);
        Ok(tasks)
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let document = self.call("get", self.backend.get(id)).await?;
        document.as_ref().map(task_from_document).transpose()
    }

    async fn require_task(&self, id: &str) -> Result<Task> {
        self.get_task(id)
            .await?
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    /// Create a task for `user_id`; the backend assigns the identifier
    pub async fn create_task(&self, user_id: &str, task: NewTask) -> Result<Task> {
        require_user(user_id)?;
        let title = validate_title(&task.title)?;
        let subtasks = clean_subtasks(task.subtasks);
        let status = if all_completed(&subtasks) {
            TaskStatus::Done
        } else {
            TaskStatus::Todo
        };

        let draft = Task {
            id: String::new(),
            user_id: user_id.to_string(),
            title,
            description: task.description.filter(|d| !d.trim().is_empty()),
            due_date: task.due_date,
            priority: task.priority,
            status,
            in_kanban: false,
            subtasks,
            updated_at: next_revision(),
        };

        let document = self
            .call("create", self.backend.insert(task_fields(&draft, &TASK_FIELDS)))
            .await?;
        let created = task_from_document(&document)?;
        info!("Created task {} for {}", created.id, user_id);
        Ok(created)
    }

    /// Apply a partial update and recompute the status
    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        self.modify(id, |_| Ok(patch)).await
    }

    /// Read the current task, derive a patch from it and write it back while
    /// holding the write lock
    async fn modify<F>(&self, id: &str, make_patch: F) -> Result<Task>
    where
        F: FnOnce(&Task) -> Result<TaskPatch>,
    {
        let _guard = self.write_lock.lock().await;
        let current = self.require_task(id).await?;
        let patch = make_patch(&current)?;
        let mut next = current.clone();
        let mut keys = vec!["status", "updatedAt"];

        if let Some(title) = &patch.title {
            next.title = validate_title(title)?;
            keys.push("title");
        }
        if let Some(description) = &patch.description {
            next.description = description.clone().filter(|d| !d.trim().is_empty());
            keys.push("description");
        }
        if let Some(due_date) = patch.due_date {
            next.due_date = due_date;
            keys.push("dueDate");
        }
        if let Some(priority) = patch.priority {
            next.priority = priority;
            keys.push("priority");
        }
        if let Some(in_kanban) = patch.in_kanban {
            next.in_kanban = in_kanban;
            keys.push("inKanban");
        }
        if let Some(subtasks) = &patch.subtasks {
            next.subtasks = clean_subtasks(subtasks.clone());
            keys.push("subtasks");
        }

        next.status = resolve_status(&current, &patch, &next.subtasks)?;
        next.updated_at = next_revision();

        let document = self
            .call("update", self.backend.merge(id, task_fields(&next, &keys)))
            .await?;
        let updated = task_from_document(&document)?;
        info!("Updated task {} (status {})", id, updated.status);
        Ok(updated)
    }

    /// Delete a task. Deleting a missing task succeeds.
    pub async fn delete_task(&self, id: &str) -> Result<()> {
        match self.call("delete", self.backend.remove(id)).await {
            Ok(true) => info!("Deleted task {}", id),
            Ok(false) | Err(Error::TaskNotFound(_)) => debug!("Task {} already gone", id),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Flip one subtask and recompute the status
    pub async fn toggle_subtask(&self, task_id: &str, subtask_id: &str) -> Result<Task> {
        self.modify(task_id, |task| {
            let mut subtasks = task.subtasks.clone();
            let subtask = subtasks
                .iter_mut()
                .find(|st| st.id == subtask_id)
                .ok_or_else(|| {
                    Error::validation("subtask", format!("unknown subtask '{}'", subtask_id))
                })?;
            subtask.completed = !subtask.completed;
            Ok(TaskPatch::default().with_subtasks(subtasks))
        })
        .await
    }

    /// `done` goes back to `todo`; anything else becomes `done`, which needs
    /// `confirmed` while subtasks are pending.
    pub async fn toggle_task_status(&self, task_id: &str, confirmed: bool) -> Result<Task> {
        self.modify(task_id, |task| {
            let mut patch = if task.status.is_done() {
                TaskPatch::status(TaskStatus::Todo)
            } else {
                TaskPatch::status(TaskStatus::Done)
            };
            patch.force_done = confirmed;
            Ok(patch)
        })
        .await
    }

    /// Put a task on the kanban board in the `todo` column
    pub async fn add_to_board(&self, task_id: &str) -> Result<Task> {
        self.update_task(
            task_id,
            TaskPatch::status(TaskStatus::Todo).with_in_kanban(true),
        )
        .await
    }

    /// Push the full task list for `user_id` now and after every change.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe_tasks_for_user<F>(&self, user_id: &str, mut on_change: F) -> Subscription
    where
        F: FnMut(Result<Vec<Task>>) + Send + 'static,
    {
        let repository = self.clone();
        let user_id = user_id.to_string();
        let mut changes = self.backend.watch();

        let handle = tokio::spawn(async move {
            on_change(repository.list_tasks_for_user(&user_id).await);
            loop {
                match changes.recv().await {
                    Ok(change) if change.affects(&user_id) => {
                        on_change(repository.list_tasks_for_user(&user_id).await);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Subscription for {} skipped {} changes", user_id, skipped);
                        on_change(repository.list_tasks_for_user(&user_id).await);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Subscription for {} ended", user_id);
        });

        Subscription {
            handle: Some(handle),
        }
    }
}
