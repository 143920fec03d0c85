//! Dashboard metrics
//!
//! Recomputed from the current task list on every request. The evaluation
//! instant is passed in so the counts stay reproducible in tests.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::task::Task;

/// Counts for one day of the weekly chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub date: NaiveDate,
    pub completed: usize,
    pub overdue: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total: usize,
    pub pending: usize,
    pub overdue: usize,
    pub completed_this_week: usize,
    pub week_start: NaiveDate,
    pub series: Vec<DayBucket>,
}

/// Monday of the week containing `date`
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// A due date counts from the start of its day
fn due_at(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

pub fn is_overdue(task: &Task, now: NaiveDateTime) -> bool {
    !task.status.is_done() && task.due_date.is_some_and(|due| due_at(due) < now)
}

impl DashboardMetrics {
    pub fn compute(tasks: &[Task], now: NaiveDateTime) -> Self {
        let week_start = start_of_week(now.date());
        let week_start_at = due_at(week_start);

        let pending = tasks.iter().filter(|t| !t.status.is_done()).count();
        let overdue = tasks.iter().filter(|t| is_overdue(t, now)).count();
        let completed_this_week = tasks
            .iter()
            .filter(|t| t.status.is_done())
            .filter_map(|t| t.due_date)
            .filter(|due| (week_start_at..=now).contains(&due_at(*due)))
            .count();

        let series = (0..7)
            .map(|offset| {
                let date = week_start + Duration::days(offset);
                let with_due = || tasks.iter().filter_map(|t| t.due_date.map(|due| (t, due)));
                DayBucket {
                    date,
                    completed: with_due()
                        .filter(|(t, due)| t.status.is_done() && *due == date)
                        .count(),
                    overdue: with_due()
                        .filter(|(t, due)| !t.status.is_done() && *due < date)
                        .count(),
                }
            })
            .collect();

        Self {
            total: tasks.len(),
            pending,
            overdue,
            completed_this_week,
            week_start,
            series,
        }
    }
}
