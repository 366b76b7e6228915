//! Remote user source module
//!
//! Supports: randomuser.me REST API, bundled offline sample
//!
//! # Overview
//!
//! A `RemoteUserSource` hands out pages identified by (page, page size,
//! seed). The concrete source is chosen from configuration with
//! [`build_source`].

mod api;
mod sample;
mod types;

pub use api::{RandomUserApi, DEFAULT_BASE_URL, INCLUDED_FIELDS};
pub use sample::SampleUserSource;
pub use types::{FetchResult, PageRequest, RemoteUserSource};

use crate::config::SourceConfig;
use crate::error::Result;
use crate::types::SourceKind;
use std::sync::Arc;

/// Build the source selected by `config.kind`
pub fn build_source(config: &SourceConfig) -> Result<Arc<dyn RemoteUserSource>> {
    let source: Arc<dyn RemoteUserSource> = match config.kind {
        SourceKind::Http => Arc::new(RandomUserApi::new(
            &config.base_url,
            config.http_client_config(),
        )?),
        SourceKind::Sample => match &config.sample_path {
            Some(path) => {
                let body = std::fs::read_to_string(path).map_err(|e| {
                    crate::error::Error::config(format!(
                        "Failed to read sample payload {}: {e}",
                        path.display()
                    ))
                })?;
                Arc::new(SampleUserSource::from_json(&body)?)
            }
            None => Arc::new(SampleUserSource::bundled()?),
        },
    };
    Ok(source)
}
