//! Remote source types and traits

use crate::error::Result;
use crate::model::UserRecord;
use async_trait::async_trait;

/// Outcome of a page fetch: the users in page order, or the failure
pub type FetchResult = Result<Vec<UserRecord>>;

/// Parameters identifying one page of the remote sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: usize,
    /// Records per page, always > 0
    pub page_size: usize,
    /// Seed pinning the pseudo-random sequence
    pub seed: String,
}

impl PageRequest {
    /// Create a page request
    pub fn new(page: usize, page_size: usize, seed: impl Into<String>) -> Self {
        Self {
            page,
            page_size,
            seed: seed.into(),
        }
    }

    /// Zero-based index of the first record on this page
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1) * self.page_size
    }
}

/// Something that can hand out pages of users.
///
/// Implementations must be idempotent for identical requests: the same
/// (page, page size, seed) yields the same users.
#[async_trait]
pub trait RemoteUserSource: Send + Sync {
    /// Fetch one page
    async fn fetch(&self, request: &PageRequest) -> FetchResult;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
