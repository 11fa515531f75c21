//! Upstream fetch: one bounded GET, no retries

use crate::config::OriginClientConfig;
use crate::error::{FetchError, FetchResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// A GET to send upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Fully-qualified upstream URL
    pub url: String,
    /// Header name/value pairs to forward
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    /// Create a request with no headers
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Builder-style method to add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A complete upstream response, held for the length of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    /// URL that was fetched
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Reason phrase for the status
    pub reason: String,
    /// Response headers, lower-cased name to first value
    pub headers: BTreeMap<String, String>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl FetchedResource {
    /// Look up a response header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The `content-type` header, if any
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

/// Capability to GET an upstream resource.
///
/// Implementations must bound the request in time and must not retry.
pub trait OriginFetcher: Send + Sync {
    /// Fetch the resource, buffering the whole body
    fn fetch(&self, request: &FetchRequest) -> impl Future<Output = FetchResult<FetchedResource>> + Send;
}

/// reqwest-backed origin client
///
/// Redirects are not followed and bodies are not decompressed: the
/// interceptor needs the origin's bytes exactly as stored.
#[derive(Clone)]
pub struct HttpOriginClient {
    inner: Client,
    config: Arc<OriginClientConfig>,
}

impl HttpOriginClient {
    /// Create a new client with default configuration
    pub fn new() -> FetchResult<Self> {
        Self::with_config(OriginClientConfig::default())
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: OriginClientConfig) -> FetchResult<Self> {
        config.validate()?;

        let inner = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(FetchError::Request)?;

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &OriginClientConfig {
        &self.config
    }

    async fn execute(&self, request: &FetchRequest) -> FetchResult<FetchedResource> {
        let url = reqwest::Url::parse(&request.url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", request.url, e)))?;
        let timeout = self.config.timeout;

        let response = self
            .inner
            .get(url)
            .headers(build_header_map(&request.headers))
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, timeout))?;

        let status = response.status();
        let headers = collect_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(e, timeout))?;

        Ok(FetchedResource {
            url: request.url.clone(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: body.to_vec(),
        })
    }
}

impl OriginFetcher for HttpOriginClient {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<FetchedResource> {
        let start = Instant::now();
        let result = self.execute(request).await;
        let elapsed_ms = start.elapsed().as_millis();

        match &result {
            Ok(resource) => debug!(
                status = resource.status,
                bytes = resource.body.len(),
                elapsed_ms,
                "Origin responded"
            ),
            Err(e) => warn!(error = %e, timeout = e.is_timeout(), elapsed_ms, "Origin fetch failed"),
        }

        result
    }
}

/// Convert forwarded pairs, dropping any the HTTP stack would reject
fn build_header_map(pairs: &[(String, String)]) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(pairs.len());

    for (name, value) in pairs {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => debug!(header = %name, "Skipping header that cannot be forwarded"),
        }
    }

    headers
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected = BTreeMap::new();

    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            collected
                .entry(name.as_str().to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    collected
}
