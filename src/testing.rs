//! Shared test fixtures: record builders and scripted collaborators

use crate::engine::{DataReady, ViewNotifier};
use crate::error::{Error, Result};
use crate::model::{Location, Name, Picture, Street, UserRecord};
use crate::source::{FetchResult, PageRequest, RemoteUserSource};
use crate::store::{LocalUserStore, MemoryUserStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

/// Build a record with the given id and name
pub fn user(id: &str, first: &str, last: &str) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        name: Name {
            title: "Mx".to_string(),
            first: first.to_string(),
            last: last.to_string(),
        },
        gender: Default::default(),
        email: format!("{}@example.com", id),
        phone: "555-0100".to_string(),
        cell: "555-0199".to_string(),
        picture: Picture {
            large: format!("https://img.test/large/{}.jpg", id),
            medium: format!("https://img.test/med/{}.jpg", id),
            thumbnail: format!("https://img.test/thumb/{}.jpg", id),
        },
        location: Location {
            street: Street {
                number: 1,
                name: "Main Street".to_string(),
            },
            city: "Springfield".to_string(),
            state: "Oregon".to_string(),
            country: "United States".to_string(),
            postcode: "97477".to_string(),
            ..Default::default()
        },
    }
}

/// Records with ids `"0"`, `"1"`, ... and distinct names
pub fn users(range: Range<usize>) -> Vec<UserRecord> {
    range
        .map(|i| {
            let mut record = user(&i.to_string(), &format!("First{i}"), &format!("Last{i}"));
            record.email = format!("user{i}@example.com");
            record
        })
        .collect()
}

// ============================================================================
// Scripted source
// ============================================================================

/// Source that replays scripted results, then falls back to deterministic
/// pages derived from the request.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<FetchResult>>,
    requests: Mutex<Vec<PageRequest>>,
    gate: Option<Semaphore>,
    /// Signalled whenever a fetch starts
    pub started: Notify,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every fetch blocks until [`ScriptedSource::release`] hands out a permit
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Some(Semaphore::new(0)),
            ..Default::default()
        })
    }

    pub fn with_script(results: Vec<FetchResult>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(results.into()),
            ..Default::default()
        })
    }

    /// Let `n` blocked fetches proceed
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().clone()
    }

    /// Page generated for `request` when nothing is scripted
    pub fn page_for(request: &PageRequest) -> Vec<UserRecord> {
        (0..request.page_size)
            .map(|i| {
                let index = request.offset() + i;
                user(
                    &format!("{}-{}", request.seed, index),
                    &format!("First{index}"),
                    &format!("Last{index}"),
                )
            })
            .collect()
    }
}

#[async_trait]
impl RemoteUserSource for ScriptedSource {
    async fn fetch(&self, request: &PageRequest) -> FetchResult {
        self.requests.lock().push(request.clone());
        self.started.notify_one();
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(Self::page_for(request)))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

// ============================================================================
// Faulty store
// ============================================================================

/// Memory store whose reads or writes can be made to fail or to block
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryUserStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_gate: Option<Semaphore>,
    /// Signalled when a non-empty `replace_all` starts
    pub write_started: Notify,
}

impl FaultyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_records(records: Vec<UserRecord>) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryUserStore::with_records(records),
            ..Default::default()
        })
    }

    /// Non-empty `replace_all` calls wait for [`FaultyStore::release_writes`]
    pub fn gated_writes() -> Arc<Self> {
        Arc::new(Self {
            write_gate: Some(Semaphore::new(0)),
            ..Default::default()
        })
    }

    pub fn release_writes(&self, n: usize) {
        if let Some(gate) = &self.write_gate {
            gate.add_permits(n);
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> Vec<UserRecord> {
        self.inner.read_all().await.unwrap()
    }

    fn check(&self, flag: &AtomicBool, op: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(Error::store(format!("{op} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl LocalUserStore for FaultyStore {
    async fn replace_all(&self, records: &[UserRecord]) -> Result<()> {
        self.check(&self.fail_writes, "write")?;
        if let (Some(gate), false) = (&self.write_gate, records.is_empty()) {
            self.write_started.notify_one();
            gate.acquire().await.unwrap().forget();
        }
        self.inner.replace_all(records).await
    }

    async fn add_all(&self, records: &[UserRecord]) -> Result<()> {
        self.check(&self.fail_writes, "write")?;
        self.inner.add_all(records).await
    }

    async fn read_all(&self) -> Result<Vec<UserRecord>> {
        self.check(&self.fail_reads, "read")?;
        self.inner.read_all().await
    }

    fn name(&self) -> &'static str {
        "faulty"
    }
}

// ============================================================================
// Recording notifier
// ============================================================================

/// Notification as seen by a [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seen {
    DataAvailable,
    RefreshStarting,
    PagingEnded,
    Error(String),
}

/// Notifier that records every call. When holding, data-ready tokens are
/// kept until [`RecordingNotifier::release`], simulating a slow reload.
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Seen>>,
    hold: bool,
    held: Mutex<Vec<DataReady>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn holding() -> Arc<Self> {
        Arc::new(Self {
            hold: true,
            ..Default::default()
        })
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().clone()
    }

    pub fn release(&self) {
        let held: Vec<DataReady> = std::mem::take(&mut *self.held.lock());
        for ready in held {
            ready.done();
        }
    }
}

impl ViewNotifier for RecordingNotifier {
    fn on_data_available(&self, ready: DataReady) {
        self.seen.lock().push(Seen::DataAvailable);
        if self.hold {
            self.held.lock().push(ready);
        } else {
            ready.done();
        }
    }

    fn on_refresh_starting(&self) {
        self.seen.lock().push(Seen::RefreshStarting);
    }

    fn on_paging_ended(&self) {
        self.seen.lock().push(Seen::PagingEnded);
    }

    fn on_error(&self, message: &str) {
        self.seen.lock().push(Seen::Error(message.to_string()));
    }
}
