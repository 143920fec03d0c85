//! Last-write-wins reconciliation of optimistic edits with backend pushes
//!
//! Every write is stamped with [`next_revision`]. The local view keeps the
//! latest confirmed copy of each task plus optional optimistic overlays; an
//! overlay is dropped once a confirmed copy at least as new arrives, or when
//! the write behind it fails.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use super::model::Task;

static LAST_REVISION: AtomicI64 = AtomicI64::new(0);

/// Wall-clock milliseconds, forced strictly increasing within the process.
pub fn next_revision() -> i64 {
    let now = Utc::now().timestamp_millis();
    let previous = LAST_REVISION
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    now.max(previous + 1)
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    confirmed: HashMap<String, Task>,
    optimistic: HashMap<String, Task>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a full list pushed by the backend.
    ///
    /// Tasks missing from the list are gone. A confirmed copy newer than the
    /// pushed one survives, since the push was produced before that write.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        let mut next = HashMap::with_capacity(tasks.len());
        for task in tasks {
            let keep = match self.confirmed.remove(&task.id) {
                Some(current) if current.updated_at > task.updated_at => current,
                _ => task,
            };
            next.insert(keep.id.clone(), keep);
        }
        self.confirmed = next;
        self.optimistic.retain(|id, _| self.confirmed.contains_key(id));
        self.drop_superseded();
    }

    /// Record the backend's copy of a single task after a successful write.
    pub fn confirm(&mut self, task: Task) {
        let newer = self
            .confirmed
            .get(&task.id)
            .map_or(true, |current| current.updated_at <= task.updated_at);
        if newer {
            self.confirmed.insert(task.id.clone(), task);
        }
        self.drop_superseded();
    }

    /// Show `task` immediately, ahead of the backend. Stamps a fresh revision.
    pub fn apply_optimistic(&mut self, mut task: Task) -> i64 {
        task.updated_at = next_revision();
        let revision = task.updated_at;
        self.optimistic.insert(task.id.clone(), task);
        revision
    }

    /// Drop the overlay for `id`, returning the task as shown afterwards.
    pub fn revert(&mut self, id: &str) -> Option<&Task> {
        self.optimistic.remove(id);
        self.confirmed.get(id)
    }

    pub fn remove(&mut self, id: &str) {
        self.confirmed.remove(id);
        self.optimistic.remove(id);
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.optimistic.contains_key(id)
    }

    /// Task as currently shown: the overlay if any, else the confirmed copy
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.optimistic.get(id).or_else(|| self.confirmed.get(id))
    }

    /// All shown tasks, ordered by id
    pub fn tasks(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .confirmed
            .keys()
            .filter_map(|id| self.get(id).cloned())
            .collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        tasks
    }

    fn drop_superseded(&mut self) {
        let confirmed = &self.confirmed;
        self.optimistic.retain(|id, overlay| {
            confirmed
                .get(id)
                .map_or(true, |c| c.updated_at < overlay.updated_at)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskPriority, TaskStatus};

    fn task(id: &str, status: TaskStatus, updated_at: i64) -> Task {
        Task {
            id: id.to_string(),
            user_id: "u1".to_string(),
            title: id.to_string(),
            description: None,
            due_date: None,
            priority: TaskPriority::Low,
            status,
            in_kanban: true,
            subtasks: Vec::new(),
            updated_at,
        }
    }

    #[test]
    fn test_next_revision_strictly_increases() {
        let a = next_revision();
        let b = next_revision();
        let c = next_revision();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_stale_push_does_not_override_optimistic() {
        let mut r = Reconciler::new();
        r.replace_all(vec![task("t1", TaskStatus::Todo, 1)]);
        r.apply_optimistic(task("t1", TaskStatus::Done, 0));

        // Push produced before the optimistic write
        r.replace_all(vec![task("t1", TaskStatus::Todo, 2)]);
        assert_eq!(r.get("t1").unwrap().status, TaskStatus::Done);
        assert!(r.is_pending("t1"));
    }

    #[test]
    fn test_later_push_supersedes_optimistic() {
        let mut r = Reconciler::new();
        r.replace_all(vec![task("t1", TaskStatus::Todo, 1)]);
        let revision = r.apply_optimistic(task("t1", TaskStatus::Done, 0));

        r.replace_all(vec![task("t1", TaskStatus::InProgress, revision + 1)]);
        assert_eq!(r.get("t1").unwrap().status, TaskStatus::InProgress);
        assert!(!r.is_pending("t1"));
    }

    #[test]
    fn test_revert_restores_confirmed() {
        let mut r = Reconciler::new();
        r.replace_all(vec![task("t1", TaskStatus::Todo, 1)]);
        r.apply_optimistic(task("t1", TaskStatus::Done, 0));

        let shown = r.revert("t1").unwrap();
        assert_eq!(shown.status, TaskStatus::Todo);
    }

    #[test]
    fn test_confirm_ignores_older_copy() {
        let mut r = Reconciler::new();
        r.confirm(task("t1", TaskStatus::Done, 10));
        r.confirm(task("t1", TaskStatus::Todo, 5));
        assert_eq!(r.get("t1").unwrap().status, TaskStatus::Done);
    }

    #[test]
    fn test_push_removes_deleted_tasks() {
        let mut r = Reconciler::new();
        r.replace_all(vec![task("t1", TaskStatus::Todo, 1), task("t2", TaskStatus::Todo, 1)]);
        r.apply_optimistic(task("t2", TaskStatus::Done, 0));
        r.replace_all(vec![task("t1", TaskStatus::Todo, 1)]);

        let ids: Vec<String> = r.tasks().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["t1".to_string()]);
        assert!(!r.is_pending("t2"));
    }
}
