//! Pagination engine module
//!
//! Fetch admission, page/seed bookkeeping and cache bootstrap.
//!
//! # Overview
//!
//! The engine module provides:
//! - `PaginationEngine` - Orchestrates source and store calls for one session
//! - `FetchSession` - Records, seed and the derived paging arithmetic
//! - `ViewNotifier` - Lifecycle callbacks towards the view
//! - `LoadOutcome` / `EngineStats` - What each operation did
//!
//! At most one fetch is in flight. A request made while one is outstanding is
//! dropped, not queued. The admission is released on every path: when a
//! failure has been reported, when a page has been persisted, or when the
//! view completes the [`DataReady`] token it was handed.

mod notifier;
mod session;
mod types;

pub use notifier::{ChannelNotifier, DataReady, ViewEvent, ViewNotifier};
pub use session::FetchSession;
pub use types::{EngineStats, LoadOutcome};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::model::UserRecord;
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::seed::new_seed;
use crate::source::{build_source, PageRequest, RemoteUserSource};
use crate::store::{build_store, LocalUserStore};
use parking_lot::{Mutex, RwLock};
use session::{Admission, InFlightGuard, Shared};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default records per page
pub const DEFAULT_PAGE_SIZE: usize = 10;

struct EngineInner {
    shared: Arc<Shared>,
    source: Arc<dyn RemoteUserSource>,
    store: Arc<dyn LocalUserStore>,
    scheduler: Arc<dyn Scheduler>,
    notifier: RwLock<Option<Weak<dyn ViewNotifier>>>,
    stats: Mutex<EngineStats>,
    /// Serializes store writes from `load_more` with the clear in `refresh`
    writes: tokio::sync::Mutex<()>,
}

/// Pagination engine for one browsing session.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct PaginationEngine {
    inner: Arc<EngineInner>,
}

impl PaginationEngine {
    /// Start building an engine
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Build an engine with the source and store selected by `config`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        Self::builder()
            .source(build_source(&config.source)?)
            .store(build_store(&config.store)?)
            .page_size(config.engine.page_size)
            .build()
    }

    /// Attach the view notifier. Only a weak handle is kept.
    pub fn inject<N: ViewNotifier + 'static>(&self, notifier: &Arc<N>) {
        let weak: Weak<N> = Arc::downgrade(notifier);
        let weak: Weak<dyn ViewNotifier> = weak;
        *self.inner.notifier.write() = Some(weak);
    }

    /// Detach the view notifier
    pub fn detach(&self) {
        *self.inner.notifier.write() = None;
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Load `next_page` and replace the records with it
    pub async fn load_initial(&self) -> LoadOutcome {
        let Some(guard) = self.inner.shared.try_begin() else {
            debug!("Fetch in flight, initial load skipped");
            return LoadOutcome::Skipped;
        };
        self.fetch_first_page(guard).await
    }

    /// Load `next_page`, append it and persist the full record set
    pub async fn load_more(&self) -> LoadOutcome {
        let Some(guard) = self.inner.shared.try_begin() else {
            debug!("Fetch in flight, load more skipped");
            return LoadOutcome::Skipped;
        };

        let request = self.inner.shared.lock().next_request();
        self.inner.stats.lock().add_page();
        info!(
            "Loading page {} from {} (seed {})",
            request.page,
            self.inner.source.name(),
            request.seed
        );

        let users = match self.inner.source.fetch(&request).await {
            Ok(users) => users,
            Err(err) => return self.fail(guard, &request, err),
        };

        let received = users.len();
        let Some(snapshot) = self.inner.shared.apply(guard.epoch(), |session| {
            session.append_records(users);
            session.records().to_vec()
        }) else {
            return self.discard(guard, &request);
        };
        self.inner.stats.lock().add_records(received);
        info!(
            "Appended {} users from page {}, {} loaded",
            received,
            request.page,
            snapshot.len()
        );

        let writes = self.inner.writes.lock().await;
        if !guard.is_current() {
            return self.discard(guard, &request);
        }
        let persisted = self.inner.store.replace_all(&snapshot).await;
        drop(writes);

        // a refresh that started during the write clears the store after us
        if !guard.is_current() {
            return self.discard(guard, &request);
        }
        self.notify(|n| n.on_paging_ended());
        if let Err(err) = persisted {
            warn!(
                "Failed to persist {} users to {} store: {}",
                snapshot.len(),
                self.inner.store.name(),
                err
            );
            self.report(&err);
        }

        drop(guard);
        LoadOutcome::Loaded { received }
    }

    /// Reset the session and schedule a fresh first page after `delay`.
    ///
    /// Records, seed and epoch are reset and `on_refresh_starting` is sent
    /// when this is called, not when the returned future is first polled.
    /// The future clears the store and schedules the reload; dropping it
    /// skips both. Only the latest of several overlapping refreshes reloads.
    pub fn refresh(&self, delay: Duration) -> impl Future<Output = ()> + Send + 'static {
        let epoch = self.begin_refresh();
        let engine = self.clone();
        async move { engine.finish_refresh(epoch, delay).await }
    }

    /// Hydrate from the local store, falling back to the network when empty
    pub async fn load_cached(&self) -> LoadOutcome {
        let Some(guard) = self.inner.shared.try_begin() else {
            debug!("Fetch in flight, cache load skipped");
            return LoadOutcome::Skipped;
        };

        let cached = match self.inner.store.read_all().await {
            Ok(cached) => cached,
            Err(err) => {
                warn!(
                    "Failed to read {} store ({:?}): {}",
                    self.inner.store.name(),
                    err.kind(),
                    err
                );
                return self.abort(guard, err);
            }
        };

        if cached.is_empty() {
            debug!("Cache empty, loading from {}", self.inner.source.name());
            return self.fetch_first_page(guard).await;
        }

        let received = cached.len();
        if self
            .inner
            .shared
            .apply(guard.epoch(), |session| session.append_records(cached))
            .is_none()
        {
            self.inner.stats.lock().add_discarded();
            debug!("Cache read overtaken by refresh, discarded");
            return LoadOutcome::Discarded;
        }
        self.inner.stats.lock().add_records(received);
        info!(
            "Loaded {} cached users from {} store",
            received,
            self.inner.store.name()
        );

        self.data_available(guard);
        LoadOutcome::Loaded { received }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Page the next fetch will request
    pub fn next_page(&self) -> usize {
        self.inner.shared.lock().next_page()
    }

    /// Upper bound on displayable users
    pub fn current_max_users(&self) -> usize {
        self.inner.shared.lock().current_max_users()
    }

    /// Distinct display names among the loaded records
    pub fn number_of_distinct_named_people(&self) -> usize {
        self.inner.shared.lock().distinct_named_people()
    }

    /// Copy of the loaded records
    pub fn records(&self) -> Vec<UserRecord> {
        self.inner.shared.lock().records().to_vec()
    }

    /// Loaded record at `index`
    pub fn record(&self, index: usize) -> Option<UserRecord> {
        self.inner.shared.lock().records().get(index).cloned()
    }

    /// Number of loaded records
    pub fn len(&self) -> usize {
        self.inner.shared.lock().records().len()
    }

    /// Whether no records are loaded
    pub fn is_empty(&self) -> bool {
        self.inner.shared.lock().records().is_empty()
    }

    /// Current seed
    pub fn seed(&self) -> String {
        self.inner.shared.lock().seed().to_string()
    }

    /// Records per page
    pub fn page_size(&self) -> usize {
        self.inner.shared.lock().page_size()
    }

    /// Whether a fetch is outstanding
    pub fn is_fetch_in_progress(&self) -> bool {
        self.inner.shared.lock().is_in_flight()
    }

    /// Snapshot of the whole session
    pub fn session(&self) -> FetchSession {
        self.inner.shared.lock().clone()
    }

    /// Get statistics
    pub fn stats(&self) -> EngineStats {
        *self.inner.stats.lock()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn fetch_first_page(&self, guard: InFlightGuard) -> LoadOutcome {
        let request = self.inner.shared.lock().next_request();
        self.inner.stats.lock().add_page();
        info!(
            "Loading page {} from {} (seed {})",
            request.page,
            self.inner.source.name(),
            request.seed
        );

        let users = match self.inner.source.fetch(&request).await {
            Ok(users) => users,
            Err(err) => return self.fail(guard, &request, err),
        };

        let received = users.len();
        if self
            .inner
            .shared
            .apply(guard.epoch(), |session| session.replace_records(users))
            .is_none()
        {
            return self.discard(guard, &request);
        }
        self.inner.stats.lock().add_records(received);
        info!("Loaded {} users from page {}", received, request.page);

        self.data_available(guard);
        LoadOutcome::Loaded { received }
    }

    fn begin_refresh(&self) -> u64 {
        let epoch = self.inner.shared.lock().reset(new_seed());
        self.inner.stats.lock().add_refresh();
        info!("Refreshing session (epoch {})", epoch);
        self.notify(|n| n.on_refresh_starting());
        epoch
    }

    async fn finish_refresh(&self, epoch: u64, delay: Duration) {
        let cleared = {
            let _writes = self.inner.writes.lock().await;
            self.inner.store.clear().await
        };
        if let Err(err) = cleared {
            warn!(
                "Failed to clear {} store: {}",
                self.inner.store.name(),
                err
            );
            self.report(&err);
        }

        debug!("Reload for epoch {} in {:?}", epoch, delay);
        let engine = self.clone();
        self.inner
            .scheduler
            .schedule(delay, Box::pin(async move { engine.reload(epoch).await }));
    }

    /// Continuation scheduled by `refresh`
    async fn reload(&self, epoch: u64) {
        loop {
            let idle = self.inner.shared.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();

            match self.inner.shared.try_begin_in(epoch) {
                Admission::Granted(guard) => {
                    self.fetch_first_page(guard).await;
                    return;
                }
                Admission::Stale => {
                    debug!("Refresh {} superseded, reload skipped", epoch);
                    return;
                }
                Admission::Busy => {
                    debug!("Refresh {} waiting for in-flight fetch", epoch);
                    idle.await;
                }
            }
        }
    }

    fn fail(&self, guard: InFlightGuard, request: &PageRequest, err: Error) -> LoadOutcome {
        if !guard.is_current() {
            return self.discard(guard, request);
        }
        warn!(
            "Failed to load page {} from {} ({:?}): {}",
            request.page,
            self.inner.source.name(),
            err.kind(),
            err
        );
        self.abort(guard, err)
    }

    fn abort(&self, guard: InFlightGuard, err: Error) -> LoadOutcome {
        self.report(&err);
        drop(guard);
        LoadOutcome::Failed {
            message: err.to_string(),
        }
    }

    fn discard(&self, guard: InFlightGuard, request: &PageRequest) -> LoadOutcome {
        self.inner.stats.lock().add_discarded();
        debug!(
            "Page {} for seed {} overtaken by refresh, discarded",
            request.page, request.seed
        );
        drop(guard);
        LoadOutcome::Discarded
    }

    fn report(&self, err: &Error) {
        self.inner.stats.lock().add_error();
        let message = err.to_string();
        self.notify(|n| n.on_error(&message));
    }

    fn data_available(&self, guard: InFlightGuard) {
        match self.notifier() {
            Some(notifier) => notifier.on_data_available(DataReady::new(guard)),
            None => drop(guard),
        }
    }

    fn notify(&self, f: impl FnOnce(&dyn ViewNotifier)) {
        if let Some(notifier) = self.notifier() {
            f(notifier.as_ref());
        }
    }

    fn notifier(&self) -> Option<Arc<dyn ViewNotifier>> {
        self.inner.notifier.read().as_ref().and_then(Weak::upgrade)
    }
}

impl fmt::Debug for PaginationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self.inner.shared.lock();
        f.debug_struct("PaginationEngine")
            .field("source", &self.inner.source.name())
            .field("store", &self.inner.store.name())
            .field("seed", &session.seed())
            .field("records", &session.records().len())
            .field("in_flight", &session.is_in_flight())
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`PaginationEngine`]
pub struct EngineBuilder {
    source: Option<Arc<dyn RemoteUserSource>>,
    store: Option<Arc<dyn LocalUserStore>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    page_size: usize,
    seed: Option<String>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            source: None,
            store: None,
            scheduler: None,
            page_size: DEFAULT_PAGE_SIZE,
            seed: None,
        }
    }
}

impl EngineBuilder {
    /// Set the remote source
    #[must_use]
    pub fn source(mut self, source: Arc<dyn RemoteUserSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the local store
    #[must_use]
    pub fn store(mut self, store: Arc<dyn LocalUserStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the scheduler used by `refresh`; defaults to [`TokioScheduler`]
    #[must_use]
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Set records per page
    #[must_use]
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Start with a fixed seed instead of a random one
    #[must_use]
    pub fn seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<PaginationEngine> {
        let source = self.source.ok_or_else(|| Error::missing_field("source"))?;
        let store = self.store.ok_or_else(|| Error::missing_field("store"))?;
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be greater than 0"));
        }
        let scheduler: Arc<dyn Scheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(TokioScheduler),
        };
        let seed = self.seed.unwrap_or_else(new_seed);

        debug!(
            "Building engine: source={}, store={}, page_size={}",
            source.name(),
            store.name(),
            self.page_size
        );

        Ok(PaginationEngine {
            inner: Arc::new(EngineInner {
                shared: Shared::new(FetchSession::new(self.page_size, seed)),
                source,
                store,
                scheduler,
                notifier: RwLock::new(None),
                stats: Mutex::new(EngineStats::new()),
                writes: tokio::sync::Mutex::new(()),
            }),
        })
    }
}
