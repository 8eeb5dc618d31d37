//! The page-fetching contract consumed by the feed engine.
//!
//! A [`PageFetcher`] knows how to load one page of one list. The engine hands
//! it a page number, a page size and a [`CancellationToken`], and expects back
//! a [`PageResponse`] or a [`FetchError`].
//!
//! # Example
//!
//! ```ignore
//! use sideline::fetch::{fetcher_fn, PageResponse, RateLimitedFetcher};
//!
//! let fetcher = fetcher_fn(|page, limit, cancel| async move {
//!     cancel.check()?;
//!     Ok(PageResponse::new(load_posts(page, limit).await))
//! });
//! let fetcher = RateLimitedFetcher::new(fetcher, 5);
//! ```

mod cancel;
mod errors;
mod rate_limit;
mod types;

pub use cancel::CancellationToken;
pub use errors::{FetchError, Result};
pub use rate_limit::{DEFAULT_REQUESTS_PER_SECOND, RateLimitedFetcher};
pub use types::{
    FeedItem, FnPageFetcher, Page, PageFetcher, PageMeta, PageResponse, fetcher_fn,
};
