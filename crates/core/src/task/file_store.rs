//! File-based document backend
//!
//! Stores task documents as JSON in a file on disk.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use super::backend::{Change, Document, DocumentBackend, Fields, OWNER_FIELD};
use crate::{Error, Result};

type Documents = BTreeMap<String, Fields>;

/// File-based document store using JSON
///
/// Every write is persisted before it becomes visible: a failed write leaves
/// both the cache and the file as they were and notifies nobody.
pub struct FileBackend {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory cache of documents, ordered by id
    documents: Mutex<Documents>,
    changes: broadcast::Sender<Change>,
}

impl FileBackend {
    /// Create a new FileBackend
    ///
    /// If the file doesn't exist, it will be created on first write.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let documents: Vec<Document> = if tokio::fs::try_exists(&path).await? {
            let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
                Error::Storage(format!("Failed to read documents file: {}", e))
            })?;
            serde_json::from_str(&content)?
        } else {
            Vec::new()
        };
        debug!("Loaded {} documents from {:?}", documents.len(), path);

        let (changes, _) = broadcast::channel(256);
        Ok(Self {
            path,
            documents: Mutex::new(documents.into_iter().map(|d| (d.id, d.fields)).collect()),
            changes,
        })
    }

    /// Write `documents` to disk
    async fn persist(&self, documents: &Documents) -> Result<()> {
        let all: Vec<Document> = documents
            .iter()
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect();
        let content = serde_json::to_string_pretty(&all)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content).await.map_err(|e| {
            warn!("Failed to write {:?}: {}", self.path, e);
            Error::Storage(format!("Failed to write documents file: {}", e))
        })
    }

    /// Persist `candidate`, then make it the live cache and notify watchers
    async fn commit(
        &self,
        documents: &mut Documents,
        candidate: Documents,
        touched: &Document,
    ) -> Result<()> {
        self.persist(&candidate).await?;
        *documents = candidate;
        // No receivers is fine
        let _ = self.changes.send(Change::for_document(touched));
        Ok(())
    }
}

#[async_trait]
impl DocumentBackend for FileBackend {
    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<Document>> {
        let documents = self.documents.lock().await;
        Ok(documents
            .iter()
            .filter(|(_, fields)| fields.get(OWNER_FIELD).and_then(|v| v.as_str()) == Some(owner_id))
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Document>> {
        let documents = self.documents.lock().await;
        Ok(documents.get(id).map(|fields| Document {
            id: id.to_string(),
            fields: fields.clone(),
        }))
    }

    async fn insert(&self, fields: Fields) -> Result<Document> {
        let document = Document {
            id: Uuid::new_v4().simple().to_string(),
            fields,
        };
        let mut documents = self.documents.lock().await;
        let mut candidate = documents.clone();
        candidate.insert(document.id.clone(), document.fields.clone());
        self.commit(&mut documents, candidate, &document).await?;
        debug!("Inserted document {}", document.id);
        Ok(document)
    }

    async fn merge(&self, id: &str, fields: Fields) -> Result<Document> {
        let mut documents = self.documents.lock().await;
        let mut candidate = documents.clone();
        let existing = candidate
            .get_mut(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        existing.extend(fields);
        let document = Document {
            id: id.to_string(),
            fields: existing.clone(),
        };
        self.commit(&mut documents, candidate, &document).await?;
        Ok(document)
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let mut documents = self.documents.lock().await;
        let mut candidate = documents.clone();
        let Some(fields) = candidate.remove(id) else {
            return Ok(false);
        };
        let document = Document {
            id: id.to_string(),
            fields,
        };
        self.commit(&mut documents, candidate, &document).await?;
        Ok(true)
    }

    fn watch(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }
}
