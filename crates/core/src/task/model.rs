//! Task model definitions

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Task status, which is also the kanban column a task renders in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    #[serde(alias = "doing")]
    InProgress,
    Done,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Todo
    }
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [Self::Todo, Self::InProgress, Self::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "todo" => Ok(Self::Todo),
            "in-progress" | "doing" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(Error::validation(
                "status",
                format!("unsupported status '{}'", other),
            )),
        }
    }
}

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Low
    }
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

impl FromStr for TaskPriority {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(Error::validation(
                "priority",
                format!("unsupported priority '{}'", other),
            )),
        }
    }
}

/// A checklist item owned by a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    #[serde(default = "new_subtask_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

fn new_subtask_id() -> String {
    Uuid::new_v4().to_string()
}

impl Subtask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_subtask_id(),
            title: title.into(),
            completed: false,
        }
    }

    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }
}

/// Trim subtask titles and drop the ones left empty.
pub fn clean_subtasks(subtasks: Vec<Subtask>) -> Vec<Subtask> {
    subtasks
        .into_iter()
        .filter_map(|mut st| {
            let trimmed = st.title.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed.len() != st.title.len() {
                st.title = trimmed.to_string();
            }
            Some(st)
        })
        .collect()
}

/// True when there is at least one subtask and every one is completed.
pub fn all_completed(subtasks: &[Subtask]) -> bool {
    !subtasks.is_empty() && subtasks.iter().all(|st| st.completed)
}

/// A user-owned task as stored in the remote backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub in_kanban: bool,
    pub subtasks: Vec<Subtask>,
    /// Revision stamp in milliseconds, see [`crate::task::next_revision`]
    pub updated_at: i64,
}

impl Task {
    pub fn has_pending_subtasks(&self) -> bool {
        self.subtasks.iter().any(|st| !st.completed)
    }

    /// Completed subtasks as a rounded percentage.
    pub fn progress(&self) -> u8 {
        if self.subtasks.is_empty() {
            return 0;
        }
        let completed = self.subtasks.iter().filter(|st| st.completed).count();
        ((completed as f64 / self.subtasks.len() as f64) * 100.0).round() as u8
    }
}

/// Input for creating a task. The backend assigns the identifier.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_subtask(mut self, subtask: Subtask) -> Self {
        self.subtasks.push(subtask);
        self
    }
}

/// Partial update. `None` leaves the field untouched.
///
/// `description` and `due_date` use a nested option so a caller can clear them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub in_kanban: Option<bool>,
    #[serde(default)]
    pub subtasks: Option<Vec<Subtask>>,
    /// Confirms marking the task done while subtasks are still pending
    #[serde(default)]
    pub force_done: bool,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_subtasks(mut self, subtasks: Vec<Subtask>) -> Self {
        self.subtasks = Some(subtasks);
        self
    }

    pub fn with_in_kanban(mut self, in_kanban: bool) -> Self {
        self.in_kanban = Some(in_kanban);
        self
    }

    pub fn forced(mut self) -> Self {
        self.force_done = true;
        self
    }
}

// Distinguishes an explicit `null` (clear) from an absent field (keep).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// List-view ordering: priority high to low, then earliest due date (undated
/// last), then pending before done.
pub fn list_order(a: &Task, b: &Task) -> Ordering {
    b.priority
        .rank()
        .cmp(&a.priority.rank())
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.status.is_done().cmp(&b.status.is_done()))
}

pub fn sort_for_list(tasks: &mut [Task]) {
    tasks.sort_by(list_order);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(title: &str, priority: TaskPriority, due: Option<&str>, status: TaskStatus) -> Task {
        Task {
            id: title.to_string(),
            user_id: "u1".to_string(),
            title: title.to_string(),
            description: None,
            due_date: due.map(|d| d.parse().unwrap()),
            priority,
            status,
            in_kanban: false,
            subtasks: Vec::new(),
            updated_at: 0,
        }
    }

    #[test]
    fn test_status_wire_values() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        let legacy: TaskStatus = serde_json::from_str("\"doing\"").unwrap();
        assert_eq!(legacy, TaskStatus::InProgress);
        assert!("archived".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_clean_subtasks_trims_and_prunes() {
        let cleaned = clean_subtasks(vec![
            Subtask::new("  write tests "),
            Subtask::new("   "),
            Subtask::new(""),
            Subtask::new("ship"),
        ]);
        let titles: Vec<&str> = cleaned.iter().map(|st| st.title.as_str()).collect();
        assert_eq!(titles, vec!["write tests", "ship"]);
    }

    #[test]
    fn test_all_completed_requires_subtasks() {
        assert!(!all_completed(&[]));
        assert!(all_completed(&[Subtask::new("a").completed()]));
        assert!(!all_completed(&[
            Subtask::new("a").completed(),
            Subtask::new("b")
        ]));
    }

    #[test]
    fn test_patch_null_clears_due_date() {
        let patch: TaskPatch = serde_json::from_str(r#"{"dueDate": null}"#).unwrap();
        assert_eq!(patch.due_date, Some(None));
        let patch: TaskPatch = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert_eq!(patch.due_date, None);
    }

    #[test]
    fn test_progress() {
        let mut t = task("t", TaskPriority::Low, None, TaskStatus::Todo);
        assert_eq!(t.progress(), 0);
        t.subtasks = vec![
            Subtask::new("a").completed(),
            Subtask::new("b"),
            Subtask::new("c"),
        ];
        assert_eq!(t.progress(), 33);
        assert!(t.has_pending_subtasks());
    }

    #[test]
    fn test_sort_for_list() {
        let mut tasks = vec![
            task("low", TaskPriority::Low, Some("2025-01-01"), TaskStatus::Todo),
            task("high-undated", TaskPriority::High, None, TaskStatus::Todo),
            task("high-late", TaskPriority::High, Some("2025-03-01"), TaskStatus::Todo),
            task("high-early-done", TaskPriority::High, Some("2025-02-01"), TaskStatus::Done),
            task("high-early", TaskPriority::High, Some("2025-02-01"), TaskStatus::Todo),
        ];
        sort_for_list(&mut tasks);
        let order: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            order,
            vec!["high-early", "high-early-done", "high-late", "high-undated", "low"]
        );
    }
}
