//! Configuration types
//!
//! The application is configured from an optional YAML file; every field has
//! a default so an empty document is a valid configuration.
//!
//! ```yaml
//! engine:
//!   page_size: 10
//!   refresh_delay_ms: 0
//! source:
//!   kind: http            # http | sample
//!   base_url: https://randomuser.me/api/1.3/
//!   timeout_secs: 30
//!   max_retries: 3
//!   requests_per_second: 5
//! store:
//!   kind: duckdb          # memory | json | duckdb
//!   path: users.duckdb
//! ```

use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::source::DEFAULT_BASE_URL;
use crate::types::{BackoffType, SourceKind, StoreKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Pagination engine settings
    #[serde(default)]
    pub engine: EngineSettings,

    /// Remote source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Local cache settings
    #[serde(default)]
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load and validate a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml_str(&contents)
    }

    /// Parse and validate a YAML configuration document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.engine.page_size == 0 {
            return Err(Error::invalid_value("engine.page_size", "must be > 0"));
        }
        if self.source.kind == SourceKind::Http {
            url::Url::parse(&self.source.base_url).map_err(|e| {
                Error::invalid_value("source.base_url", format!("not a valid URL: {e}"))
            })?;
        }
        if matches!(self.store.kind, StoreKind::Json) && self.store.path.is_none() {
            return Err(Error::missing_field("store.path"));
        }
        Ok(())
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Pagination engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSettings {
    /// Records requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Delay between a refresh request and the reload, in milliseconds
    #[serde(default)]
    pub refresh_delay_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            refresh_delay_ms: 0,
        }
    }
}

impl EngineSettings {
    /// Refresh delay as a duration
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }
}

fn default_page_size() -> usize {
    10
}

// ============================================================================
// Source
// ============================================================================

/// Remote source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Which source to use
    #[serde(default)]
    pub kind: SourceKind,

    /// API endpoint (http source)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds (http source)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Transport retries per request (http source)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff between transport retries (http source)
    #[serde(default)]
    pub backoff: BackoffType,

    /// Request rate ceiling; 0 disables rate limiting (http source)
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Alternative payload file (sample source)
    #[serde(default)]
    pub sample_path: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff: BackoffType::default(),
            requests_per_second: default_requests_per_second(),
            sample_path: None,
        }
    }
}

impl SourceConfig {
    /// Transport settings derived from this section
    pub fn http_client_config(&self) -> HttpClientConfig {
        let defaults = HttpClientConfig::default();
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .max_retries(self.max_retries)
            .backoff(
                self.backoff,
                defaults.retry.initial_delay,
                defaults.retry.max_delay,
            );

        builder = if self.requests_per_second == 0 {
            builder.no_rate_limit()
        } else {
            builder.rate_limit(RateLimiterConfig::new(
                self.requests_per_second,
                self.requests_per_second,
            ))
        };

        builder.build()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_requests_per_second() -> u32 {
    5
}

// ============================================================================
// Store
// ============================================================================

/// Local cache settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Which store to use
    #[serde(default)]
    pub kind: StoreKind,

    /// Backing file; required for `json`, optional for `duckdb` (in-memory
    /// database when absent)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_is_default() {
        let config = AppConfig::from_yaml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.engine.page_size, 10);
        assert_eq!(config.source.kind, SourceKind::Http);
        assert_eq!(config.source.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.store.kind, StoreKind::Duckdb);
    }

    #[test]
    fn test_parse_full_document() {
        let yaml = r"
engine:
  page_size: 25
  refresh_delay_ms: 500
source:
  kind: sample
  timeout_secs: 5
  max_retries: 1
  backoff: linear
  requests_per_second: 0
store:
  kind: json
  path: /tmp/users.json
";
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.engine.page_size, 25);
        assert_eq!(config.engine.refresh_delay(), Duration::from_millis(500));
        assert_eq!(config.source.kind, SourceKind::Sample);
        assert_eq!(config.source.backoff, BackoffType::Linear);
        assert_eq!(config.store.kind, StoreKind::Json);
        assert_eq!(config.store.path, Some(PathBuf::from("/tmp/users.json")));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = AppConfig::from_yaml_str("engine:\n  page_size: 0\n").unwrap_err();
        assert!(err.to_string().contains("engine.page_size"));
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let err = AppConfig::from_yaml_str("source:\n  base_url: nope\n").unwrap_err();
        assert!(err.to_string().contains("source.base_url"));
    }

    #[test]
    fn test_json_store_requires_path() {
        let err = AppConfig::from_yaml_str("store:\n  kind: json\n").unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = AppConfig::from_yaml_str("engine:\n  pagesize: 3\n").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_http_client_config_mapping() {
        let source = SourceConfig {
            timeout_secs: 7,
            max_retries: 1,
            requests_per_second: 0,
            ..SourceConfig::default()
        };
        let http = source.http_client_config();
        assert_eq!(http.timeout, Duration::from_secs(7));
        assert_eq!(http.retry.max_retries, 1);
        assert!(http.rate_limit.is_none());

        let http = SourceConfig::default().http_client_config();
        assert_eq!(http.rate_limit, Some(RateLimiterConfig::new(5, 5)));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/nonexistent/randomuser.yaml").unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "engine:\n  page_size: 3\nstore:\n  kind: memory\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.engine.page_size, 3);
        assert_eq!(config.store.kind, StoreKind::Memory);
    }
}
