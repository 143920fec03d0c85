//! Accessibility preferences: theme, font scale and reduced motion

mod model;
mod root;
mod storage;
mod store;

pub use model::*;
pub use root::*;
pub use storage::*;
pub use store::*;
