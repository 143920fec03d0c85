//! Document backend trait
//!
//! The remote store keeps one document per task in a collection keyed by
//! owner. Implementations only move documents around; translating them into
//! [`Task`](super::Task) values is the repository's job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::Result;

/// Field name holding the owner identifier on every task document
pub const OWNER_FIELD: &str = "userId";

pub type Fields = Map<String, Value>;

/// A raw document as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn owner(&self) -> Option<&str> {
        self.fields.get(OWNER_FIELD).and_then(Value::as_str)
    }
}

/// Change notification pushed to watchers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Owner whose documents changed; `None` means anything may have changed
    pub owner_id: Option<String>,
}

impl Change {
    pub fn owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
        }
    }

    pub fn everything() -> Self {
        Self { owner_id: None }
    }

    /// Change touching `document`'s owner, or everything when it has none
    pub fn for_document(document: &Document) -> Self {
        document.owner().map_or_else(Self::everything, Self::owner)
    }

    pub fn affects(&self, owner_id: &str) -> bool {
        self.owner_id.as_deref().map_or(true, |o| o == owner_id)
    }
}

/// Storage interface for task documents
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// All documents whose owner field equals `owner_id`
    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<Document>>;

    /// Get a document by ID
    async fn get(&self, id: &str) -> Result<Option<Document>>;

    /// Store a new document, assigning its identifier
    async fn insert(&self, fields: Fields) -> Result<Document>;

    /// Merge `fields` into an existing document
    async fn merge(&self, id: &str, fields: Fields) -> Result<Document>;

    /// Remove a document, returning whether it existed
    async fn remove(&self, id: &str) -> Result<bool>;

    /// Subscribe to change notifications
    fn watch(&self) -> broadcast::Receiver<Change>;
}
