// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # randomuser
//!
//! Pagination engine for browsing pages of random users, with pluggable
//! remote sources and local caches.
//!
//! ## Features
//!
//! - **Single-flight paging**: at most one fetch outstanding, extra requests dropped
//! - **Seeded pages**: page number + seed pin the remote sequence
//! - **Refresh**: new seed, cleared cache, delayed reload; overlapping refreshes coalesce
//! - **Cache bootstrap**: hydrate from the local store before touching the network
//! - **Sources**: randomuser.me REST API (retry, backoff, rate limit) or bundled sample
//! - **Stores**: memory, JSON file, embedded DuckDB
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use randomuser::{ChannelNotifier, PaginationEngine, RandomUserApi, MemoryUserStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> randomuser::Result<()> {
//!     let engine = PaginationEngine::builder()
//!         .source(Arc::new(RandomUserApi::public()?))
//!         .store(Arc::new(MemoryUserStore::new()))
//!         .build()?;
//!
//!     let (notifier, mut events) = ChannelNotifier::new();
//!     engine.inject(&notifier);
//!
//!     engine.load_cached().await;
//!     while let Ok(event) = events.try_recv() {
//!         // render, then release the engine
//!     }
//!     engine.load_more().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      PaginationEngine                         │
//! │  load_initial()  load_more()  refresh(delay)  load_cached()   │
//! └───────────────────────────────────────────────────────────────┘
//!          │                   │                │            │
//! ┌────────┴────────┬──────────┴──────┬─────────┴──────┬─────┴──────┐
//! │ RemoteUserSource│ LocalUserStore  │   Scheduler    │ViewNotifier│
//! ├─────────────────┼─────────────────┼────────────────┼────────────┤
//! │ randomuser.me   │ Memory          │ Tokio          │ Channel    │
//! │ Sample payload  │ JSON file       │ Manual (tests) │            │
//! │                 │ DuckDB          │                │            │
//! └─────────────────┴─────────────────┴────────────────┴────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// YAML application configuration
pub mod config;

/// User records and API payloads
pub mod model;

/// HTTP client with retry and rate limiting
pub mod http;

/// Remote user sources
pub mod source;

/// Local user caches
pub mod store;

/// Delayed task scheduling
pub mod scheduler;

/// Seed generation
pub mod seed;

/// Pagination engine
pub mod engine;

/// Command-line interface
pub mod cli;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorKind, Result};
pub use types::*;

// Re-export commonly used types
pub use config::AppConfig;
pub use engine::{
    ChannelNotifier, DataReady, LoadOutcome, PaginationEngine, ViewEvent, ViewNotifier,
};
pub use model::UserRecord;
pub use scheduler::{ManualScheduler, Scheduler, TokioScheduler};
pub use source::{PageRequest, RandomUserApi, RemoteUserSource, SampleUserSource};
pub use store::{DuckDbUserStore, JsonFileUserStore, LocalUserStore, MemoryUserStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
