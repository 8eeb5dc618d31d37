use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::fetch::{CancellationToken, FetchError, PageFetcher, PageResponse, Result};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::retry::{RetryConfig, with_retry};

use super::endpoint::ListEndpoint;
use super::types::ApiErrorBody;

/// Longest error body echoed into a [`FetchError::Status`] message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Fetches pages of one [`ListEndpoint`] over HTTP.
///
/// Sends `GET {base}{path}?page={page}&limit={limit}` and decodes the
/// `{ "data": [...], "meta": {...} }` envelope. Rate-limited responses are
/// retried per the [`RetryConfig`]; everything else is mapped to a
/// [`FetchError`] and left to the feed engine to classify.
pub struct HttpPageFetcher<T> {
    transport: Arc<dyn HttpTransport>,
    base_url: Url,
    endpoint: ListEndpoint,
    token: Option<String>,
    retry: RetryConfig,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for HttpPageFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            base_url: self.base_url.clone(),
            endpoint: self.endpoint.clone(),
            token: self.token.clone(),
            retry: self.retry.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for HttpPageFetcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPageFetcher")
            .field("base_url", &self.base_url.as_str())
            .field("endpoint", &self.endpoint)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl<T> HttpPageFetcher<T> {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: Url, endpoint: ListEndpoint) -> Self {
        Self {
            transport,
            base_url,
            endpoint,
            token: None,
            retry: RetryConfig::default(),
            _marker: PhantomData,
        }
    }

    /// Send `Authorization: Bearer {token}` with every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &ListEndpoint {
        &self.endpoint
    }

    /// The full URL for one page.
    pub fn page_url(&self, page: u32, limit: u32) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{}{}", base, self.endpoint.path()))
            .map_err(|e| FetchError::internal(format!("invalid endpoint URL: {e}")))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page", &page.to_string());
            query.append_pair("limit", &limit.to_string());
            for (key, value) in self.endpoint.extra_query() {
                query.append_pair(key, value);
            }
        }

        Ok(url)
    }

    fn build_request(&self, url: &Url) -> HttpRequest {
        let request = HttpRequest::get(url.as_str()).header("Accept", "application/json");
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }
}

impl<T> HttpPageFetcher<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_once(&self, url: &Url) -> Result<PageResponse<T>> {
        let response = self
            .transport
            .send(self.build_request(url))
            .await
            .map_err(|e| FetchError::network(e.to_string()))?;

        decode_response(response)
    }
}

#[async_trait]
impl<T> PageFetcher<T> for HttpPageFetcher<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_page(
        &self,
        page: u32,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<PageResponse<T>> {
        let url = self.page_url(page, limit)?;

        tracing::debug!(
            feed = %self.endpoint,
            page,
            limit,
            url = %url,
            "Fetching page"
        );

        with_retry(
            || self.fetch_once(&url),
            &self.retry,
            cancel,
            self.endpoint.label(),
        )
        .await
    }
}

/// Map a raw response onto the page envelope or a [`FetchError`].
fn decode_response<T: DeserializeOwned>(response: HttpResponse) -> Result<PageResponse<T>> {
    if response.is_success() {
        return serde_json::from_slice(&response.body)
            .map_err(|e| FetchError::decode(format!("invalid page body: {e}")));
    }

    if response.status == 429 {
        let retry_after = response
            .header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(FetchError::RateLimited { retry_after });
    }

    Err(FetchError::status(response.status, error_message(&response)))
}

/// The server's error message, falling back to the (truncated) body text.
fn error_message(response: &HttpResponse) -> String {
    if let Ok(body) = serde_json::from_slice::<ApiErrorBody>(&response.body)
        && let Some(message) = body.into_message()
    {
        return message;
    }

    let text = String::from_utf8_lossy(&response.body);
    let text = text.trim();
    if text.is_empty() {
        format!("HTTP {}", response.status)
    } else {
        text.chars().take(MAX_ERROR_BODY_CHARS).collect()
    }
}
