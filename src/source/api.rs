//! randomuser.me REST source

use super::types::{FetchResult, PageRequest, RemoteUserSource};
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::model::UserPage;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Default API endpoint; the version segment pins the response format
pub const DEFAULT_BASE_URL: &str = "https://randomuser.me/api/1.3/";

/// Fields requested through the `inc` parameter
pub const INCLUDED_FIELDS: &str = "name,picture,gender,location,email,phone,cell,login";

/// Remote source backed by the randomuser.me API
#[derive(Debug)]
pub struct RandomUserApi {
    client: HttpClient,
    endpoint: Url,
}

impl RandomUserApi {
    /// Create a source for `base_url` using a client built from `config`
    pub fn new(base_url: &str, config: HttpClientConfig) -> Result<Self> {
        let endpoint = Url::parse(base_url)?;
        let client = HttpClient::with_config(config)?;
        Ok(Self { client, endpoint })
    }

    /// Create a source for the public endpoint with default transport settings
    pub fn public() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL, HttpClientConfig::default())
    }

    /// The endpoint queried for pages
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_config(request: &PageRequest) -> RequestConfig {
        RequestConfig::new()
            .query("page", request.page.to_string())
            .query("results", request.page_size.to_string())
            .query("seed", request.seed.as_str())
            .query("inc", INCLUDED_FIELDS)
    }
}

#[async_trait]
impl RemoteUserSource for RandomUserApi {
    async fn fetch(&self, request: &PageRequest) -> FetchResult {
        debug!(
            "Fetching page {} ({} results, seed {}) from {}",
            request.page, request.page_size, request.seed, self.endpoint
        );

        let body = self
            .client
            .get_text(self.endpoint.as_str(), &Self::request_config(request))
            .await?;

        let page = UserPage::from_json(&body)?;
        if let Some(info) = &page.info {
            if info.seed != request.seed || info.page != request.page {
                debug!(
                    "API echoed page {} seed {} for requested page {} seed {}",
                    info.page, info.seed, request.page, request.seed
                );
            }
        }

        Ok(page.users)
    }

    fn name(&self) -> &'static str {
        "randomuser-api"
    }
}
