//! In-memory store

use super::types::LocalUserStore;
use crate::error::Result;
use crate::model::UserRecord;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Store that lives only as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    records: Arc<RwLock<Vec<UserRecord>>>,
}

impl MemoryUserStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `records`
    pub fn with_records(records: Vec<UserRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Number of cached records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl LocalUserStore for MemoryUserStore {
    async fn replace_all(&self, records: &[UserRecord]) -> Result<()> {
        let mut cached = self.records.write().await;
        *cached = records.to_vec();
        Ok(())
    }

    async fn add_all(&self, records: &[UserRecord]) -> Result<()> {
        self.records.write().await.extend_from_slice(records);
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<UserRecord>> {
        Ok(self.records.read().await.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
