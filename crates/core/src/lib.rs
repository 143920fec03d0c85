//! Core library for Taskdeck
//!
//! This crate contains the stateful pieces of the task manager:
//! - Task model, backends and the repository adapter
//! - Kanban board reassignment
//! - Accessibility preferences and theme styling
//! - Dashboard and calendar derivations

pub mod calendar;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod kanban;
pub mod preferences;
pub mod style;
pub mod task;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
