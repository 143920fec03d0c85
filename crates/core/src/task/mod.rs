//! Task module
//!
//! Task records, their translation to and from backend documents, the
//! backends themselves and the repository the views talk to.

mod backend;
mod document;
mod file_store;
mod http_backend;
mod memory_backend;
mod model;
mod reconcile;
mod repository;

pub use backend::{Change, Document, DocumentBackend, Fields, OWNER_FIELD};
pub use document::{task_fields, task_from_document, TASK_FIELDS};
pub use file_store::FileBackend;
pub use http_backend::HttpBackend;
pub use memory_backend::MemoryBackend;
pub use model::*;
pub use reconcile::{next_revision, Reconciler};
pub use repository::{resolve_status, Subscription, TaskRepository, DEFAULT_REQUEST_TIMEOUT};
