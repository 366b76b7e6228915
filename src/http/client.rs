//! HTTP transport for the remote user source
//!
//! Everything goes through one GET-with-query path. Each attempt waits on the
//! rate limiter, sends once, and the result is sorted into a [`Verdict`]:
//! accept the response, retry after a delay, or give up with an error.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use crate::types::{BackoffType, StringMap};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Seconds to wait on a 429 that carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// How many times to retry and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Growth of the delay between attempts
    pub backoff: BackoffType,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffType::Exponential,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after failed attempt number `attempt` (0-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = match self.backoff {
            BackoffType::Constant => self.initial_delay,
            BackoffType::Linear => self.initial_delay.saturating_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => self
                .initial_delay
                .saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(self.max_delay)
    }
}

/// Transport settings shared by every request of a client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Prefix for relative targets
    pub base_url: Option<String>,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Retry budget and backoff
    pub retry: RetryPolicy,
    /// Token bucket applied before every attempt; `None` disables it
    pub rate_limit: Option<RateLimiterConfig>,
    /// Headers sent with every request
    pub default_headers: StringMap,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: StringMap::new(),
            user_agent: format!("randomuser/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for [`HttpClientConfig`]
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    /// Backoff shape plus its first and largest delay
    #[must_use]
    pub fn backoff(mut self, backoff: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.retry = RetryPolicy {
            backoff,
            initial_delay: initial,
            max_delay: max,
            ..self.config.retry
        };
        self
    }

    #[must_use]
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    #[must_use]
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Per-request query, headers and overrides
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, sent in insertion order
    pub query: Vec<(String, String)>,
    /// Headers added on top of the client defaults
    pub headers: StringMap,
    /// Replaces the client timeout
    pub timeout: Option<Duration>,
    /// Replaces the client retry budget
    pub max_retries: Option<u32>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }
}

/// What to do with the result of one attempt
enum Verdict {
    Accept(Response),
    Retry { delay: Duration, cause: Error },
    Reject(Error),
}

/// GET-only HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;
        let limiter = config.rate_limit.as_ref().map(RateLimiter::new);
        Ok(Self {
            client,
            config,
            limiter,
        })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.limiter.is_some()
    }

    /// GET `target`, retrying transient failures.
    ///
    /// `target` is either absolute or relative to the configured base URL.
    /// Any 4xx or 5xx that is not retried becomes [`Error::HttpStatus`]
    /// carrying the response body.
    pub async fn get(&self, target: &str, request: &RequestConfig) -> Result<Response> {
        let url = self.resolve(target);
        let timeout = request.timeout.unwrap_or(self.config.timeout);
        let budget = request.max_retries.unwrap_or(self.config.retry.max_retries);

        for attempt in 0..=budget {
            if let Some(limiter) = &self.limiter {
                limiter.wait().await;
            }

            let sent = self.prepare(&url, request, timeout).send().await;
            match self.judge(sent, attempt, attempt < budget, timeout).await {
                Verdict::Accept(response) => {
                    debug!("GET {} -> {}", url, response.status());
                    return Ok(response);
                }
                Verdict::Reject(err) => return Err(err),
                Verdict::Retry { delay, cause } => {
                    warn!(
                        "GET {} failed ({}), attempt {}/{}, retrying in {:?}",
                        url,
                        cause,
                        attempt + 1,
                        budget + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(Error::MaxRetriesExceeded {
            max_retries: budget,
        })
    }

    /// [`HttpClient::get`] and read the body as text
    pub async fn get_text(&self, target: &str, request: &RequestConfig) -> Result<String> {
        self.get(target, request)
            .await?
            .text()
            .await
            .map_err(|e| Error::decode(format!("Failed to read response body: {e}")))
    }

    fn prepare(&self, url: &str, request: &RequestConfig, timeout: Duration) -> RequestBuilder {
        let mut builder = self
            .config
            .default_headers
            .iter()
            .chain(&request.headers)
            .fold(self.client.get(url), |builder, (key, value)| {
                builder.header(key.as_str(), value.as_str())
            });
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder.timeout(timeout)
    }

    async fn judge(
        &self,
        sent: reqwest::Result<Response>,
        attempt: u32,
        can_retry: bool,
        timeout: Duration,
    ) -> Verdict {
        let response = match sent {
            Ok(response) => response,
            Err(err) => {
                let transient = err.is_timeout() || err.is_connect();
                let cause = if err.is_timeout() {
                    Error::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    }
                } else {
                    Error::Http(err)
                };
                return if transient && can_retry {
                    Verdict::Retry {
                        delay: self.config.retry.delay(attempt),
                        cause,
                    }
                } else {
                    Verdict::Reject(cause)
                };
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let seconds = retry_after_secs(&response);
            let cause = Error::RateLimited {
                retry_after_seconds: seconds,
            };
            return if can_retry {
                Verdict::Retry {
                    delay: Duration::from_secs(seconds),
                    cause,
                }
            } else {
                Verdict::Reject(cause)
            };
        }

        if can_retry && is_transient(status) {
            return Verdict::Retry {
                delay: self.config.retry.delay(attempt),
                cause: Error::http_status(status.as_u16(), ""),
            };
        }

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Verdict::Reject(Error::http_status(status.as_u16(), body));
        }

        Verdict::Accept(response)
    }

    fn resolve(&self, target: &str) -> String {
        let absolute = target.starts_with("http://") || target.starts_with("https://");
        match &self.config.base_url {
            Some(base) if !absolute => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                target.trim_start_matches('/')
            ),
            _ => target.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Server-side failures worth another attempt
fn is_transient(status: StatusCode) -> bool {
    matches!(status.as_u16(), 500 | 502..=504 | 520..=524)
}

fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}
