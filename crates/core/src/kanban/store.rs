//! Kanban reassignment flow
//!
//! Holds the board's local copy of the task list, applies drops
//! optimistically and reconciles with the repository's authoritative state.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::task::{Reconciler, Subscription, Task, TaskPatch, TaskRepository, TaskStatus};
use crate::Result;

use super::model::{column_title, plan_drop, DragGesture, DropPlan, IgnoreReason, KanbanBoardView};

/// Result of a completed drag
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum DropOutcome {
    /// The backend accepted the new column
    Moved { task: Task, announcement: String },
    /// Nothing to do; the card snaps back
    Unchanged { reason: IgnoreReason },
    /// Dropping into `done` with pending subtasks; retry with confirmation
    NeedsConfirmation { task_id: String },
    /// A reassignment for this task is still in flight
    Busy { task_id: String },
}

#[derive(Default)]
struct BoardState {
    tasks: Reconciler,
    in_flight: HashSet<String>,
}

/// Board controller shared by the kanban views
#[derive(Clone)]
pub struct KanbanBoard {
    repository: TaskRepository,
    state: Arc<Mutex<BoardState>>,
}

impl KanbanBoard {
    pub fn new(repository: TaskRepository) -> Self {
        Self {
            repository,
            state: Arc::new(Mutex::new(BoardState::default())),
        }
    }

    // Critical sections never await, so a plain mutex is enough
    fn state(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the user's tasks and replace the local copy
    pub async fn load(&self, user_id: &str) -> Result<()> {
        let tasks = self.repository.list_tasks_for_user(user_id).await?;
        self.apply_push(tasks);
        Ok(())
    }

    /// Merge a full task list pushed by the backend
    pub fn apply_push(&self, tasks: Vec<Task>) {
        debug!("Board received {} tasks", tasks.len());
        self.state().tasks.replace_all(tasks);
    }

    /// Keep the board in sync with the backend until the handle is dropped
    pub fn subscribe(&self, user_id: &str) -> Subscription {
        let board = self.clone();
        self.repository
            .subscribe_tasks_for_user(user_id, move |result| match result {
                Ok(tasks) => board.apply_push(tasks),
                Err(e) => warn!("Board refresh failed: {}", e),
            })
    }

    pub fn view(&self) -> KanbanBoardView {
        KanbanBoardView::from_tasks(&self.state().tasks.tasks())
    }

    pub fn task(&self, id: &str) -> Option<Task> {
        self.state().tasks.get(id).cloned()
    }

    /// Handle a finished drag.
    ///
    /// A move between columns issues exactly one update. The new column shows
    /// at once and is rolled back if the update fails.
    pub async fn drop_task(&self, gesture: &DragGesture, confirmed: bool) -> Result<DropOutcome> {
        let (task_id, to) = {
            let mut state = self.state();
            let plan = plan_drop(gesture, |id: &str| state.tasks.get(id));
            let (task_id, from, to) = match plan {
                DropPlan::Ignore(reason) => {
                    debug!("Drop of {} ignored: {:?}", gesture.task_id, reason);
                    return Ok(DropOutcome::Unchanged { reason });
                }
                DropPlan::Move { task_id, from, to } => (task_id, from, to),
            };

            if state.in_flight.contains(&task_id) {
                return Ok(DropOutcome::Busy { task_id });
            }

            let Some(current) = state.tasks.get(&task_id).cloned() else {
                return Ok(DropOutcome::Unchanged {
                    reason: IgnoreReason::NotOnBoard,
                });
            };
            if to.is_done() && current.has_pending_subtasks() && !confirmed {
                return Ok(DropOutcome::NeedsConfirmation { task_id });
            }

            let mut optimistic = current;
            optimistic.status = to;
            optimistic.in_kanban = true;
            state.tasks.apply_optimistic(optimistic);
            state.in_flight.insert(task_id.clone());
            info!("Moving task {} from {} to {}", task_id, from, to);
            (task_id, to)
        };

        let mut patch = TaskPatch::status(to).with_in_kanban(true);
        patch.force_done = confirmed;
        let result = self.repository.update_task(&task_id, patch).await;

        let mut state = self.state();
        state.in_flight.remove(&task_id);
        match result {
            Ok(task) => {
                state.tasks.confirm(task.clone());
                Ok(DropOutcome::Moved {
                    task,
                    announcement: format!("Task moved to {}", column_title(to)),
                })
            }
            Err(e) => {
                warn!("Reverting move of {}: {}", task_id, e);
                state.tasks.revert(&task_id);
                Err(e)
            }
        }
    }

    /// Put an available task on the board in the `todo` column
    pub async fn add_to_board(&self, task_id: &str) -> Result<Task> {
        let task = self.repository.add_to_board(task_id).await?;
        self.state().tasks.confirm(task.clone());
        info!("Task {} added to board", task_id);
        Ok(task)
    }

    pub fn is_in_flight(&self, task_id: &str) -> bool {
        self.state().in_flight.contains(task_id)
    }

    /// Tasks currently shown in `column`
    pub fn column_len(&self, column: TaskStatus) -> usize {
        self.view().column(column).map_or(0, |c| c.tasks.len())
    }
}
