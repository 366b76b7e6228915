//! Fetch session state and in-flight admission

use crate::model::{distinct_names, UserRecord};
use crate::source::PageRequest;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use tokio::sync::Notify;

/// Paging state of one browsing session.
///
/// `next_page` and `current_max_users` are pure functions of the record
/// count, so they hold for every reachable state.
#[derive(Debug, Clone)]
pub struct FetchSession {
    records: Vec<UserRecord>,
    seed: String,
    page_size: usize,
    in_flight: bool,
    epoch: u64,
}

impl FetchSession {
    /// Create an empty session
    pub fn new(page_size: usize, seed: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            seed: seed.into(),
            page_size,
            in_flight: false,
            epoch: 0,
        }
    }

    /// Accumulated records, in arrival order
    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    /// Current seed
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Records per page
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Whether a fetch is outstanding
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Refresh generation; bumped by every refresh
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// `floor(records / page_size) + 1`
    pub fn next_page(&self) -> usize {
        self.records.len() / self.page_size + 1
    }

    /// Upper bound on displayable users; rows past `records().len()` but
    /// below this can show a loading placeholder
    pub fn current_max_users(&self) -> usize {
        self.next_page() * self.page_size
    }

    /// Distinct display names among the records
    pub fn distinct_named_people(&self) -> usize {
        distinct_names(&self.records)
    }

    /// Request for the next page under the current seed
    pub fn next_request(&self) -> PageRequest {
        PageRequest::new(self.next_page(), self.page_size, self.seed.clone())
    }

    pub(crate) fn replace_records(&mut self, records: Vec<UserRecord>) {
        self.records = records;
    }

    pub(crate) fn append_records(&mut self, records: Vec<UserRecord>) {
        self.records.extend(records);
    }

    /// Drop all records, adopt `seed`, start a new epoch
    pub(crate) fn reset(&mut self, seed: String) -> u64 {
        self.records.clear();
        self.seed = seed;
        self.epoch += 1;
        self.epoch
    }
}

/// Result of asking to start a fetch on behalf of a given epoch
pub(crate) enum Admission {
    Granted(InFlightGuard),
    Busy,
    Stale,
}

/// Session plus the wake-up used when a fetch settles
pub(crate) struct Shared {
    session: Mutex<FetchSession>,
    pub(crate) idle: Notify,
}

impl Shared {
    pub(crate) fn new(session: FetchSession) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(session),
            idle: Notify::new(),
        })
    }

    /// Lock the session. Never hold the guard across an `.await`.
    pub(crate) fn lock(&self) -> MutexGuard<'_, FetchSession> {
        self.session.lock()
    }

    /// Mark a fetch in flight unless one already is
    pub(crate) fn try_begin(self: &Arc<Self>) -> Option<InFlightGuard> {
        let mut session = self.session.lock();
        if session.in_flight {
            return None;
        }
        session.in_flight = true;
        Some(InFlightGuard {
            shared: Arc::clone(self),
            epoch: session.epoch,
        })
    }

    /// Like `try_begin`, but refuses once the session has moved past `epoch`
    pub(crate) fn try_begin_in(self: &Arc<Self>, epoch: u64) -> Admission {
        let mut session = self.session.lock();
        if session.epoch != epoch {
            return Admission::Stale;
        }
        if session.in_flight {
            return Admission::Busy;
        }
        session.in_flight = true;
        Admission::Granted(InFlightGuard {
            shared: Arc::clone(self),
            epoch,
        })
    }

    /// Run `f` on the session if it is still in `epoch`
    pub(crate) fn apply<R>(&self, epoch: u64, f: impl FnOnce(&mut FetchSession) -> R) -> Option<R> {
        let mut session = self.session.lock();
        if session.epoch != epoch {
            return None;
        }
        Some(f(&mut session))
    }
}

/// Holds the in-flight flag; dropping it clears the flag on every path.
pub(crate) struct InFlightGuard {
    shared: Arc<Shared>,
    epoch: u64,
}

impl InFlightGuard {
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn is_current(&self) -> bool {
        self.shared.lock().epoch == self.epoch
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.shared.session.lock().in_flight = false;
        self.shared.idle.notify_waiters();
    }
}
