use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::cancel::CancellationToken;
use super::errors::Result;

/// A record shown in a paginated list (post, match, group, request...).
///
/// The engine never looks at anything but the identifier.
pub trait FeedItem: Clone + Send + Sync + 'static {
    /// Stable, unique identifier of this record.
    fn id(&self) -> &str;
}

/// Pagination metadata returned alongside a page of data.
///
/// Every field is optional; servers differ in what they report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Page number the server actually served (1-indexed).
    pub page: Option<u32>,
    /// Total number of records across all pages.
    pub total_count: Option<u64>,
    /// Total number of pages.
    pub total_pages: Option<u32>,
    /// Whether another page exists after this one.
    pub has_next_page: Option<bool>,
    /// Whether a page exists before this one.
    pub has_prev_page: Option<bool>,
}

/// Raw answer of a [`PageFetcher`]: `{ data: [...], meta?: {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T> PageResponse<T> {
    /// A response without metadata.
    pub fn new(data: Vec<T>) -> Self {
        Self { data, meta: None }
    }

    /// Attach pagination metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: PageMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Resolve this response into a [`Page`] for a request of `requested_page`
    /// with page size `limit`.
    ///
    /// `hasNextPage` comes from the metadata when the server reports it, then
    /// from `page < totalPages`, and only then from "the page came back full".
    pub fn into_page(self, requested_page: u32, limit: u32) -> Page<T> {
        let meta = self.meta.unwrap_or_default();
        let current_page = meta.page.unwrap_or(requested_page).max(1);

        let has_next_page = match (meta.has_next_page, meta.total_pages) {
            (Some(has_next), _) => has_next,
            (None, Some(total)) => current_page < total,
            (None, None) => self.data.len() == limit as usize,
        };

        Page {
            items: self.data,
            current_page,
            has_next_page,
            total_count: meta.total_count,
        }
    }
}

/// One resolved page of items.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-indexed page number.
    pub current_page: u32,
    pub has_next_page: bool,
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    /// An empty terminal page, used for benign "no more data" answers.
    pub fn empty(current_page: u32) -> Self {
        Self {
            items: Vec::new(),
            current_page: current_page.max(1),
            has_next_page: false,
            total_count: None,
        }
    }
}

/// Fetches one page of a list from wherever the list lives.
///
/// Implementations must honour `cancel`: once it fires, the call has to fail
/// with an error for which [`FetchError::is_cancellation`] is true instead of
/// resolving with data.
///
/// [`FetchError::is_cancellation`]: super::FetchError::is_cancellation
#[async_trait]
pub trait PageFetcher<T: Send + 'static>: Send + Sync {
    async fn fetch_page(
        &self,
        page: u32,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<PageResponse<T>>;
}

#[async_trait]
impl<T, F> PageFetcher<T> for Arc<F>
where
    T: Send + 'static,
    F: PageFetcher<T> + ?Sized,
{
    async fn fetch_page(
        &self,
        page: u32,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<PageResponse<T>> {
        (**self).fetch_page(page, limit, cancel).await
    }
}

/// [`PageFetcher`] backed by an async closure. See [`fetcher_fn`].
pub struct FnPageFetcher<F> {
    f: F,
}

/// Wrap an async closure `(page, limit, token) -> Result<PageResponse<T>>` as a
/// [`PageFetcher`].
///
/// # Example
///
/// ```ignore
/// use sideline::fetch::{fetcher_fn, PageResponse};
///
/// let fetcher = fetcher_fn(|page, limit, _cancel| async move {
///     api.list_posts(page, limit).await
/// });
/// ```
pub fn fetcher_fn<T, F, Fut>(f: F) -> FnPageFetcher<F>
where
    F: Fn(u32, u32, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<PageResponse<T>>> + Send + 'static,
{
    FnPageFetcher { f }
}

#[async_trait]
impl<T, F, Fut> PageFetcher<T> for FnPageFetcher<F>
where
    T: Send + 'static,
    F: Fn(u32, u32, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<PageResponse<T>>> + Send + 'static,
{
    async fn fetch_page(
        &self,
        page: u32,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<PageResponse<T>> {
        (self.f)(page, limit, cancel.clone()).await
    }
}
