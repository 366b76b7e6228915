//! Offline source serving a fixed payload
//!
//! Stands in for the network during demos and tests. The seed is ignored;
//! pages are consecutive slices of the payload and pages past the end are
//! empty.

use super::types::{FetchResult, PageRequest, RemoteUserSource};
use crate::error::Result;
use crate::model::{UserPage, UserRecord};
use async_trait::async_trait;

const BUNDLED_SAMPLE: &str = include_str!("sample.json");

/// Source that pages through an in-memory list of users
#[derive(Debug, Clone)]
pub struct SampleUserSource {
    users: Vec<UserRecord>,
}

impl SampleUserSource {
    /// Source over the payload shipped with the crate
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_SAMPLE)
    }

    /// Source over an API-shaped JSON payload
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(Self::from_users(UserPage::from_json(body)?.users))
    }

    /// Source over the given users
    pub fn from_users(users: Vec<UserRecord>) -> Self {
        Self { users }
    }

    /// Total number of users available
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl RemoteUserSource for SampleUserSource {
    async fn fetch(&self, request: &PageRequest) -> FetchResult {
        let start = request.offset().min(self.users.len());
        let end = (start + request.page_size).min(self.users.len());
        Ok(self.users[start..end].to_vec())
    }

    fn name(&self) -> &'static str {
        "sample"
    }
}
