//! Theme-conditional styling
//!
//! Every view asks [`token`] for the classes of an element role instead of
//! branching on the theme itself. Tokens carry only the theme-dependent part;
//! layout classes stay with the view.

use serde::Serialize;

use crate::preferences::{FontScale, Theme};
use crate::task::{TaskPriority, TaskStatus};

/// Where a token is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", content = "variant", rename_all = "kebab-case")]
pub enum ElementRole {
    Page,
    Card,
    Text,
    MutedText,
    Input,
    PrimaryButton,
    OutlineButton,
    Column(TaskStatus),
    ColumnCount,
    DropHint,
    PriorityBadge(TaskPriority),
    StatusBadge(TaskStatus),
    DueBadge,
    Spinner,
}

impl ElementRole {
    /// Roles that do not depend on a task
    pub const STATIC: [ElementRole; 11] = [
        Self::Page,
        Self::Card,
        Self::Text,
        Self::MutedText,
        Self::Input,
        Self::PrimaryButton,
        Self::OutlineButton,
        Self::ColumnCount,
        Self::DropHint,
        Self::DueBadge,
        Self::Spinner,
    ];

    /// Stable key for serialised token maps
    pub fn key(self) -> String {
        match self {
            Self::Page => "page".to_string(),
            Self::Card => "card".to_string(),
            Self::Text => "text".to_string(),
            Self::MutedText => "muted-text".to_string(),
            Self::Input => "input".to_string(),
            Self::PrimaryButton => "primary-button".to_string(),
            Self::OutlineButton => "outline-button".to_string(),
            Self::Column(status) => format!("column-{}", status),
            Self::ColumnCount => "column-count".to_string(),
            Self::DropHint => "drop-hint".to_string(),
            Self::PriorityBadge(priority) => format!("priority-{}", priority.as_str()),
            Self::StatusBadge(status) => format!("status-{}", status),
            Self::DueBadge => "due-badge".to_string(),
            Self::Spinner => "spinner".to_string(),
        }
    }
}

/// Classes for `role` under `theme`
pub fn token(theme: Theme, role: ElementRole) -> &'static str {
    use ElementRole::*;
    use Theme::{Dark, Dyslexia, HighContrast};

    match (role, theme) {
        (Page, HighContrast) => "bg-black text-white",
        (Page, Dark) => "bg-gray-900 text-gray-100",
        (Page, Dyslexia) => "bg-amber-50 text-gray-800",
        (Page, Theme::Default) => "bg-gray-50 text-gray-900",

        (Card, HighContrast) => "bg-white text-black border-yellow-400",
        (Card, Dark) => "bg-gray-800 text-gray-100 border-gray-700",
        (Card, Dyslexia) => "bg-white text-gray-800 border-amber-200",
        (Card, Theme::Default) => "bg-white text-gray-800 border-gray-200",

        (Text, HighContrast) => "text-white",
        (Text, Dark) => "text-gray-100",
        (Text, Dyslexia | Theme::Default) => "text-gray-800",

        (MutedText, HighContrast) => "text-gray-300",
        (MutedText, Dark) => "text-gray-400",
        (MutedText, Dyslexia | Theme::Default) => "text-gray-600",

        (Input, HighContrast) => "border-yellow-400 focus:ring-yellow-500 focus:border-yellow-500",
        (Input, Dark) => "border-gray-600 bg-gray-700 focus:ring-emerald-500 focus:border-emerald-500",
        (Input, Dyslexia) => "border-amber-300 focus:ring-amber-500 focus:border-amber-500",
        (Input, Theme::Default) => "border-gray-300 focus:ring-emerald-500 focus:border-emerald-500",

        (PrimaryButton, HighContrast) => {
            "bg-yellow-400 text-black hover:bg-yellow-500 focus:ring-yellow-500 focus:ring-offset-black"
        }
        (PrimaryButton, Dark) => {
            "bg-emerald-600 text-white hover:bg-emerald-500 focus:ring-emerald-500 focus:ring-offset-gray-900"
        }
        (PrimaryButton, Dyslexia) => "bg-amber-600 text-white hover:bg-amber-500 focus:ring-amber-500",
        (PrimaryButton, Theme::Default) => "bg-emerald-600 text-white hover:bg-emerald-700 focus:ring-emerald-500",

        (OutlineButton, HighContrast) => {
            "border-yellow-400 text-yellow-400 hover:bg-yellow-400 hover:text-black focus:ring-yellow-500 focus:ring-offset-black"
        }
        (OutlineButton, Dark) => {
            "border-gray-600 text-gray-300 hover:bg-gray-700 focus:ring-gray-500 focus:ring-offset-gray-900"
        }
        (OutlineButton, Dyslexia) => "border-amber-300 text-amber-700 hover:bg-amber-100 focus:ring-amber-400",
        (OutlineButton, Theme::Default) => "border-gray-300 text-gray-700 hover:bg-gray-100 focus:ring-gray-500",

        (Column(status), theme) => column_token(theme, status),

        (ColumnCount, HighContrast) => "bg-yellow-400 text-black",
        (ColumnCount, _) => "bg-white text-gray-600",

        (DropHint, HighContrast) => "bg-black border-2 border-dashed border-yellow-400 text-yellow-300",
        (DropHint, _) => "bg-gray-100 border-2 border-dashed border-gray-300 text-gray-500",

        (PriorityBadge(priority), HighContrast) => match priority {
            TaskPriority::High => "bg-red-500 text-black",
            TaskPriority::Medium => "bg-yellow-500 text-black",
            TaskPriority::Low => "bg-emerald-500 text-black",
        },
        (PriorityBadge(priority), _) => match priority {
            TaskPriority::High => "bg-red-100 text-red-800",
            TaskPriority::Medium => "bg-amber-100 text-amber-900",
            TaskPriority::Low => "bg-emerald-100 text-emerald-800",
        },

        (StatusBadge(status), HighContrast) if status.is_done() => "bg-emerald-500 text-black",
        (StatusBadge(_), HighContrast) => "bg-gray-500 text-black",
        (StatusBadge(status), _) if status.is_done() => "bg-emerald-100 text-emerald-800",
        (StatusBadge(_), _) => "bg-gray-100 text-gray-700",

        (DueBadge, HighContrast) => "bg-blue-500 text-black",
        (DueBadge, _) => "bg-blue-100 text-blue-800",

        (Spinner, HighContrast) => "border-yellow-400",
        (Spinner, _) => "border-emerald-500",
    }
}

fn column_token(theme: Theme, status: TaskStatus) -> &'static str {
    match (theme, status) {
        (Theme::HighContrast, TaskStatus::Todo) => "bg-black border-yellow-400",
        (Theme::HighContrast, TaskStatus::InProgress) => "bg-black border-blue-400",
        (Theme::HighContrast, TaskStatus::Done) => "bg-black border-emerald-400",
        (Theme::Dark, TaskStatus::Todo) => "bg-gray-800 border-gray-600",
        (Theme::Dark, TaskStatus::InProgress) => "bg-gray-800 border-blue-500",
        (Theme::Dark, TaskStatus::Done) => "bg-gray-800 border-emerald-500",
        (Theme::Dyslexia, TaskStatus::Todo) => "bg-amber-50 border-amber-200",
        (Theme::Dyslexia, TaskStatus::InProgress) => "bg-amber-50 border-blue-200",
        (Theme::Dyslexia, TaskStatus::Done) => "bg-amber-50 border-emerald-200",
        (Theme::Default, TaskStatus::Todo) => "bg-gray-50 border-gray-200",
        (Theme::Default, TaskStatus::InProgress) => "bg-blue-50 border-blue-200",
        (Theme::Default, TaskStatus::Done) => "bg-emerald-50 border-emerald-200",
    }
}

pub fn font_size_class(scale: FontScale) -> &'static str {
    match scale {
        FontScale::Normal => "",
        FontScale::Large => "text-lg",
        FontScale::XLarge => "text-xl",
    }
}

/// Animation class for spinners; empty when motion is reduced
pub fn motion_class(reduced_motion: bool) -> &'static str {
    if reduced_motion {
        ""
    } else {
        "animate-spin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_theme_has_distinct_page_tokens() {
        let mut seen: Vec<&str> = Theme::ALL
            .into_iter()
            .map(|theme| token(theme, ElementRole::Page))
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), Theme::ALL.len());
    }

    #[test]
    fn test_columns_follow_theme() {
        assert_eq!(
            token(Theme::Default, ElementRole::Column(TaskStatus::InProgress)),
            "bg-blue-50 border-blue-200"
        );
        assert_eq!(
            token(Theme::HighContrast, ElementRole::Column(TaskStatus::Done)),
            "bg-black border-emerald-400"
        );
    }

    #[test]
    fn test_status_badge_only_distinguishes_done() {
        let todo = token(Theme::Dark, ElementRole::StatusBadge(TaskStatus::Todo));
        let doing = token(Theme::Dark, ElementRole::StatusBadge(TaskStatus::InProgress));
        let done = token(Theme::Dark, ElementRole::StatusBadge(TaskStatus::Done));
        assert_eq!(todo, doing);
        assert_ne!(todo, done);
    }

    #[test]
    fn test_font_and_motion_classes() {
        assert_eq!(font_size_class(FontScale::Normal), "");
        assert_eq!(font_size_class(FontScale::XLarge), "text-xl");
        assert_eq!(motion_class(false), "animate-spin");
        assert_eq!(motion_class(true), "");
    }

    #[test]
    fn test_role_keys() {
        assert_eq!(ElementRole::Column(TaskStatus::InProgress).key(), "column-in-progress");
        assert_eq!(ElementRole::PriorityBadge(TaskPriority::High).key(), "priority-high");
        assert_eq!(ElementRole::MutedText.key(), "muted-text");
    }
}
