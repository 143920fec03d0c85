//! In-process document backend

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use super::backend::{Change, Document, DocumentBackend, Fields, OWNER_FIELD};
use crate::{Error, Result};

/// Document backend that keeps everything in memory
pub struct MemoryBackend {
    documents: RwLock<HashMap<String, Fields>>,
    changes: broadcast::Sender<Change>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(256);
        Self {
            documents: RwLock::new(HashMap::new()),
            changes,
        }
    }

    fn notify(&self, document: &Document) {
        // No receivers is fine
        let _ = self.changes.send(Change::for_document(document));
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<Document>> {
        let documents = self.documents.read().await;
        let mut matches: Vec<Document> = documents
            .iter()
            .filter(|(_, fields)| {
                fields.get(OWNER_FIELD).and_then(|v| v.as_str()) == Some(owner_id)
            })
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matches)
    }

    async fn get(&self, id: &str) -> Result<Option<Document>> {
        let documents = self.documents.read().await;
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
        {
            let mut documents = self.documents.write().await;
            documents.insert(document.id.clone(), document.fields.clone());
        }
        debug!("Inserted document {}", document.id);
        self.notify(&document);
        Ok(document)
    }

    async fn merge(&self, id: &str, fields: Fields) -> Result<Document> {
        let document = {
            let mut documents = self.documents.write().await;
            let existing = documents
                .get_mut(id)
                .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
            existing.extend(fields);
            Document {
                id: id.to_string(),
                fields: existing.clone(),
            }
        };
        self.notify(&document);
        Ok(document)
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let removed = {
            let mut documents = self.documents.write().await;
            documents.remove(id)
        };
        match removed {
            Some(fields) => {
                self.notify(&Document {
                    id: id.to_string(),
                    fields,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn watch(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(owner: &str, title: &str) -> Fields {
        let mut f = Fields::new();
        f.insert(OWNER_FIELD.to_string(), json!(owner));
        f.insert("title".to_string(), json!(title));
        f
    }

    #[tokio::test]
    async fn test_query_filters_by_owner() {
        let backend = MemoryBackend::new();
        backend.insert(fields("u1", "a")).await.unwrap();
        backend.insert(fields("u2", "b")).await.unwrap();
        backend.insert(fields("u1", "c")).await.unwrap();

        assert_eq!(backend.query_by_owner("u1").await.unwrap().len(), 2);
        assert_eq!(backend.query_by_owner("u2").await.unwrap().len(), 1);
        assert!(backend.query_by_owner("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_merge_keeps_untouched_fields() {
        let backend = MemoryBackend::new();
        let doc = backend.insert(fields("u1", "a")).await.unwrap();

        let mut patch = Fields::new();
        patch.insert("title".to_string(), json!("renamed"));
        let merged = backend.merge(&doc.id, patch).await.unwrap();

        assert_eq!(merged.fields["title"], json!("renamed"));
        assert_eq!(merged.owner(), Some("u1"));
    }

    #[tokio::test]
    async fn test_merge_missing_document() {
        let backend = MemoryBackend::new();
        let result = backend.merge("missing", Fields::new()).await;
        assert!(matches!(result, Err(Error::TaskNotFound(_))));
    }

    #[tokio::test]
    async fn test_watch_receives_owner_change() {
        let backend = MemoryBackend::new();
        let mut rx = backend.watch();
        let doc = backend.insert(fields("u1", "a")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), Change::owner("u1"));

        assert!(backend.remove(&doc.id).await.unwrap());
        assert_eq!(rx.recv().await.unwrap(), Change::owner("u1"));
        assert!(!backend.remove(&doc.id).await.unwrap());
    }
}
