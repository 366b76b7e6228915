//! Engine types
//!
//! Load outcomes and running statistics for the pagination engine.

/// What a load operation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Another fetch was in flight; nothing happened
    Skipped,
    /// Records were received and applied
    Loaded {
        /// Number of records in the page or cache read
        received: usize,
    },
    /// The operation failed; the message was forwarded to the notifier
    Failed {
        /// Error display string
        message: String,
    },
    /// The result belonged to a session that has since been refreshed
    Discarded,
}

impl LoadOutcome {
    /// Check if records were applied
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// Check if the operation was refused because of an in-flight fetch
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Number of records received, zero unless loaded
    pub fn received(&self) -> usize {
        match self {
            Self::Loaded { received } => *received,
            _ => 0,
        }
    }
}

/// Running statistics of an engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Pages requested from the source
    pub pages_fetched: usize,
    /// Records received from the source or the cache
    pub records_received: usize,
    /// Failures reported through `on_error`
    pub errors: usize,
    /// Results dropped because a refresh overtook them
    pub discarded: usize,
    /// Refreshes started
    pub refreshes: usize,
}

impl EngineStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records_received += count;
    }

    /// Add an error
    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    /// Add a discarded result
    pub fn add_discarded(&mut self) {
        self.discarded += 1;
    }

    /// Add a refresh
    pub fn add_refresh(&mut self) {
        self.refreshes += 1;
    }
}
