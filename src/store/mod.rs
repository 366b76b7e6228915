//! Local user store module
//!
//! Supports: in-memory, JSON file, embedded DuckDB
//!
//! # Overview
//!
//! A `LocalUserStore` caches fetched users between runs so the browser can
//! bootstrap without the network. The concrete store is chosen from
//! configuration with [`build_store`].

mod database;
mod file;
mod memory;
mod types;

pub use database::DuckDbUserStore;
pub use file::JsonFileUserStore;
pub use memory::MemoryUserStore;
pub use types::LocalUserStore;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::types::StoreKind;
use std::sync::Arc;

/// Build the store selected by `config.kind`
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn LocalUserStore>> {
    let store: Arc<dyn LocalUserStore> = match config.kind {
        StoreKind::Memory => Arc::new(MemoryUserStore::new()),
        StoreKind::Json => {
            let path = config
                .path
                .as_ref()
                .ok_or_else(|| Error::missing_field("store.path"))?;
            Arc::new(JsonFileUserStore::new(path))
        }
        StoreKind::Duckdb => match &config.path {
            Some(path) => Arc::new(DuckDbUserStore::open(path)?),
            None => Arc::new(DuckDbUserStore::in_memory()?),
        },
    };
    Ok(store)
}
