//! Kanban board
//!
//! Three fixed columns (todo, in progress, done) derived from task status,
//! plus the drag-and-drop reassignment flow that moves tasks between them.

mod model;
mod store;

pub use model::*;
pub use store::*;
