//! Sideline: keeps the app's paginated lists in sync with the API.
//!
//! Every list screen (events feed, match feed, my posts, my matches, groups,
//! pending requests) is backed by a [`FeedSynchronizer`] driving a
//! [`PageFetcher`]. The engine owns pagination, de-duplication, cancellation
//! of superseded requests and error classification; fetchers only know how
//! to load a single page.
//!
//! - [`feed`]: the synchronization engine and its observable state.
//! - [`fetch`]: the page-fetcher contract, cancellation and rate limiting.
//! - [`api`]: HTTP fetchers for the app's list endpoints.
//! - [`http`]: the transport seam under the HTTP fetchers.
//! - [`retry`]: rate-limit backoff used by fetchers.

pub mod api;
pub mod feed;
pub mod fetch;
pub mod http;
pub mod retry;

pub use api::{ApiRecord, HttpPageFetcher, ListEndpoint};
pub use feed::{
    EmptyPageConditions, FeedEvent, FeedEventCallback, FeedOptions, FeedState, FeedSynchronizer,
    LoadMode, SkipReason,
};
pub use fetch::{
    CancellationToken, FeedItem, FetchError, Page, PageFetcher, PageMeta, PageResponse,
    RateLimitedFetcher, fetcher_fn,
};
#[cfg(feature = "http")]
pub use http::reqwest_transport::ReqwestTransport;
