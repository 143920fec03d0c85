//! Kanban board model definitions
//!
//! The board is derived from the task list: a task with `in_kanban` set
//! renders in the column matching its status. Nothing here is stored.

use serde::{Deserialize, Serialize};

use crate::task::{sort_for_list, Task, TaskStatus};

/// Column titles in board order
pub fn column_title(column: TaskStatus) -> &'static str {
    match column {
        TaskStatus::Todo => "To Do",
        TaskStatus::InProgress => "In Progress",
        TaskStatus::Done => "Done",
    }
}

/// A column in the kanban board
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanColumn {
    pub id: TaskStatus,
    pub title: String,
    pub tasks: Vec<Task>,
}

/// The board as rendered: three fixed columns plus the tasks not on it yet
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanBoardView {
    pub columns: Vec<KanbanColumn>,
    pub available: Vec<Task>,
}

impl KanbanBoardView {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut columns: Vec<KanbanColumn> = TaskStatus::ALL
            .iter()
            .map(|&status| KanbanColumn {
                id: status,
                title: column_title(status).to_string(),
                tasks: Vec::new(),
            })
            .collect();
        let mut available = Vec::new();

        for task in tasks {
            if !task.in_kanban {
                available.push(task.clone());
                continue;
            }
            if let Some(column) = columns.iter_mut().find(|c| c.id == task.status) {
                column.tasks.push(task.clone());
            }
        }

        for column in &mut columns {
            sort_for_list(&mut column.tasks);
        }
        sort_for_list(&mut available);

        Self { columns, available }
    }

    pub fn column(&self, id: TaskStatus) -> Option<&KanbanColumn> {
        self.columns.iter().find(|c| c.id == id)
    }
}

/// What a drag ended over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum DropTarget {
    Column(TaskStatus),
    /// Another card; resolves to the column that card sits in
    Card(String),
}

/// A completed drag gesture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragGesture {
    pub task_id: String,
    /// `None` when dropped outside every column
    #[serde(default)]
    pub over: Option<DropTarget>,
}

/// Why a drop does nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IgnoreReason {
    OutsideColumns,
    SameColumn,
    NotOnBoard,
    UnknownTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPlan {
    Move {
        task_id: String,
        from: TaskStatus,
        to: TaskStatus,
    },
    Ignore(IgnoreReason),
}

/// Work out what a drag gesture does, given a lookup of the shown tasks.
pub fn plan_drop<'a, F>(gesture: &DragGesture, lookup: F) -> DropPlan
where
    F: Fn(&str) -> Option<&'a Task>,
{
    let Some(task) = lookup(&gesture.task_id).filter(|t| t.in_kanban) else {
        return DropPlan::Ignore(IgnoreReason::NotOnBoard);
    };

    let target = match &gesture.over {
        None => return DropPlan::Ignore(IgnoreReason::OutsideColumns),
        Some(DropTarget::Column(column)) => *column,
        Some(DropTarget::Card(card_id)) if card_id == &task.id => {
            return DropPlan::Ignore(IgnoreReason::SameColumn)
        }
        Some(DropTarget::Card(card_id)) => match lookup(card_id).filter(|t| t.in_kanban) {
            Some(card) => card.status,
            None => return DropPlan::Ignore(IgnoreReason::UnknownTarget),
        },
    };

    if target == task.status {
        return DropPlan::Ignore(IgnoreReason::SameColumn);
    }

    DropPlan::Move {
        task_id: task.id.clone(),
        from: task.status,
        to: target,
    }
}
