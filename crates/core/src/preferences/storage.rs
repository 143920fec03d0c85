//! Durable key-value storage for preferences
//!
//! Values are plain strings, one key per setting.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::PoisonError;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{Error, Result};

pub const THEME_KEY: &str = "accessibility-theme";
pub const FONT_SIZE_KEY: &str = "accessibility-font-size";
pub const REDUCED_MOTION_KEY: &str = "accessibility-reduced-motion";

#[async_trait]
pub trait PreferenceStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Storage that lives only as long as the process
#[derive(Default)]
pub struct MemoryStorage {
    values: std::sync::Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object on disk, rewritten on every set
pub struct FileStorage {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if tokio::fs::try_exists(&path).await? {
            let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
                Error::Storage(format!("Failed to read preferences file: {}", e))
            })?;
            serde_json::from_str(&content).map_err(|e| {
                Error::Storage(format!("Failed to parse preferences file: {}", e))
            })?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PreferenceStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().await;
        Ok(values.get(key).cloned())
    }

    /// The value is kept only once the file has been written
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().await;
        let mut candidate = values.clone();
        candidate.insert(key.to_string(), value.to_string());
        let content = serde_json::to_string_pretty(&candidate)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("Failed to create directory: {}", e)))?;
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write preferences file: {}", e)))?;
        *values = candidate;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_storage_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs").join("preferences.json");

        let storage = FileStorage::open(&path).await.unwrap();
        assert_eq!(storage.get(THEME_KEY).await.unwrap(), None);
        storage.set(THEME_KEY, "dark").await.unwrap();

        let reopened = FileStorage::open(&path).await.unwrap();
        assert_eq!(reopened.get(THEME_KEY).await.unwrap().as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn test_unreadable_file_is_storage_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        tokio::fs::write(&path, "[1, 2").await.unwrap();

        assert!(matches!(FileStorage::open(&path).await, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let storage = FileStorage::open(&path).await.unwrap();
        storage.set(THEME_KEY, "dark").await.unwrap();

        tokio::fs::remove_file(&path).await.unwrap();
        tokio::fs::create_dir(&path).await.unwrap();

        assert!(storage.set(THEME_KEY, "dyslexia").await.is_err());
        assert_eq!(storage.get(THEME_KEY).await.unwrap().as_deref(), Some("dark"));
    }
}
