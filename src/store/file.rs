//! JSON file store
//!
//! Persists the cache as a single JSON document with atomic writes.

use super::types::LocalUserStore;
use crate::error::{Error, Result};
use crate::model::UserRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    #[serde(default)]
    users: Vec<UserRecord>,
}

/// Store backed by a JSON file
#[derive(Debug)]
pub struct JsonFileUserStore {
    /// Path to the cache file
    path: PathBuf,
    /// Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl JsonFileUserStore {
    /// Create a store at `path`; the file is created on first write
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// Get the cache file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<UserRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::store(format!("Failed to read cache file: {e}")))?;

        let file: CacheFile = serde_json::from_str(&contents)
            .map_err(|e| Error::store(format!("Failed to parse cache file: {e}")))?;

        if file.version != FORMAT_VERSION {
            return Err(Error::store(format!(
                "Unsupported cache file version {}",
                file.version
            )));
        }

        Ok(file.users)
    }

    async fn save(&self, users: &[UserRecord]) -> Result<()> {
        let file = CacheFile {
            version: FORMAT_VERSION,
            users: users.to_vec(),
        };
        let contents = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::store(format!("Failed to serialize cache: {e}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::store(format!("Failed to create cache directory: {e}")))?;
            }
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::store(format!("Failed to write cache file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::store(format!("Failed to rename cache file: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl LocalUserStore for JsonFileUserStore {
    async fn replace_all(&self, records: &[UserRecord]) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.save(records).await
    }

    async fn add_all(&self, records: &[UserRecord]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut users = self.load().await?;
        users.extend_from_slice(records);
        self.save(&users).await
    }

    async fn read_all(&self) -> Result<Vec<UserRecord>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
