//! Local store trait

use crate::error::Result;
use crate::model::UserRecord;
use async_trait::async_trait;

/// Persistent cache of user records.
///
/// `read_all` returns records in insertion order.
#[async_trait]
pub trait LocalUserStore: Send + Sync {
    /// Replace the whole cache with `records`
    async fn replace_all(&self, records: &[UserRecord]) -> Result<()>;

    /// Append `records` after the cached ones
    async fn add_all(&self, records: &[UserRecord]) -> Result<()>;

    /// Every cached record
    async fn read_all(&self) -> Result<Vec<UserRecord>>;

    /// Drop every cached record
    async fn clear(&self) -> Result<()> {
        self.replace_all(&[]).await
    }

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
