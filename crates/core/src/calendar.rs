//! Calendar events derived from dated tasks

use chrono::NaiveDate;
use serde::Serialize;

use crate::preferences::Theme;
use crate::task::{Task, TaskPriority};

/// Hex colours for one event chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventColors {
    pub background: &'static str,
    pub text: &'static str,
    pub border: &'static str,
}

const fn colors(background: &'static str, text: &'static str, border: &'static str) -> EventColors {
    EventColors {
        background,
        text,
        border,
    }
}

pub fn priority_colors(theme: Theme, priority: TaskPriority) -> EventColors {
    match (theme, priority) {
        (Theme::HighContrast, TaskPriority::High) => colors("#FF0000", "#000000", "#FF0000"),
        (Theme::HighContrast, TaskPriority::Medium) => colors("#FFFF00", "#000000", "#FFFF00"),
        (Theme::HighContrast, TaskPriority::Low) => colors("#00FF00", "#000000", "#00FF00"),
        (Theme::Dark, TaskPriority::High) => colors("#EF4444", "#FFFFFF", "#B91C1C"),
        (Theme::Dark, TaskPriority::Medium) => colors("#F59E0B", "#FFFFFF", "#B45309"),
        (Theme::Dark, TaskPriority::Low) => colors("#10B981", "#FFFFFF", "#059669"),
        (Theme::Default | Theme::Dyslexia, TaskPriority::High) => {
            colors("#FEE2E2", "#B91C1C", "#FECACA")
        }
        (Theme::Default | Theme::Dyslexia, TaskPriority::Medium) => {
            colors("#FEF9C3", "#B45309", "#FDE68A")
        }
        (Theme::Default | Theme::Dyslexia, TaskPriority::Low) => {
            colors("#ECFDF5", "#059669", "#A7F3D0")
        }
    }
}

/// An all-day calendar entry for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub task_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub priority: TaskPriority,
    #[serde(flatten)]
    pub colors: EventColors,
    pub aria_label: String,
}

impl CalendarEvent {
    fn for_task(task: &Task, date: NaiveDate, theme: Theme) -> Self {
        Self {
            task_id: task.id.clone(),
            title: task.title.clone(),
            date,
            priority: task.priority,
            colors: priority_colors(theme, task.priority),
            aria_label: format!(
                "{}, {} priority, due {}",
                task.title,
                task.priority.as_str(),
                date.format("%Y-%m-%d")
            ),
        }
    }
}

/// One event per task with a due date, ordered by date then title
pub fn events(tasks: &[Task], theme: Theme) -> Vec<CalendarEvent> {
    let mut events: Vec<CalendarEvent> = tasks
        .iter()
        .filter_map(|task| {
            task.due_date
                .map(|date| CalendarEvent::for_task(task, date, theme))
        })
        .collect();
    events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.title.cmp(&b.title)));
    events
}

/// Events whose date falls in `from..=to`. Open bounds are unbounded.
pub fn events_in_range(
    tasks: &[Task],
    theme: Theme,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<CalendarEvent> {
    events(tasks, theme)
        .into_iter()
        .filter(|e| from.map_or(true, |from| e.date >= from))
        .filter(|e| to.map_or(true, |to| e.date <= to))
        .collect()
}
