//! HTTP fetching used for site pages and logo downloads.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::ResolveError;

/// A fetched resource: status, raw body and response headers
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub status: u16,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

impl FetchedResource {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Fail with a transport error unless the status is 2xx
    pub fn require_success(self, url: &str) -> Result<Self, ResolveError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ResolveError::transport(url, format!("non-success status {}", self.status)))
        }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedResource, ResolveError>;
}

/// reqwest-backed fetcher with the configured user agent and timeout
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, ResolveError> {
        let client = build_client(config)?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

/// Build the shared reqwest client for a run
pub fn build_client(config: &HttpConfig) -> Result<reqwest::Client, ResolveError> {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| ResolveError::transport("<client>", e))
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedResource, ResolveError> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ResolveError::transport(url, e))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| ResolveError::transport(url, format!("failed to read body: {}", e)))?
            .to_vec();

        debug!("Fetched {} ({} bytes, status {})", url, body.len(), status);

        Ok(FetchedResource { status, body, headers })
    }
}
