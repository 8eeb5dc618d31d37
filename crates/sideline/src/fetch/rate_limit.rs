use std::marker::PhantomData;
use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use super::cancel::CancellationToken;
use super::errors::{FetchError, Result};
use super::types::{PageFetcher, PageResponse};

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default proactive request rate for page fetches (requests per second).
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 5;

fn quota(requests_per_second: u32) -> Quota {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    Quota::per_second(rps)
}

/// A rate-limited wrapper around any [`PageFetcher`].
///
/// Every fetch waits for the limiter before delegating. Several feeds that
/// talk to the same API can share one limiter by cloning the wrapper or by
/// building them with [`RateLimitedFetcher::sharing`].
///
/// A cancelled token abandons the wait with [`FetchError::Cancelled`].
pub struct RateLimitedFetcher<F, T> {
    inner: F,
    rate_limiter: Arc<GovernorRateLimiter>,
    _item: PhantomData<fn() -> T>,
}

impl<F, T> RateLimitedFetcher<F, T> {
    /// Create a new rate-limited fetcher.
    ///
    /// # Arguments
    ///
    /// * `inner` - The underlying fetcher to wrap
    /// * `requests_per_second` - Maximum requests per second (0 is treated as 1)
    pub fn new(inner: F, requests_per_second: u32) -> Self {
        Self {
            inner,
            rate_limiter: Arc::new(RateLimiter::direct(quota(requests_per_second))),
            _item: PhantomData,
        }
    }

    /// Wrap `inner` using the same limiter as `other`.
    pub fn sharing<G>(inner: F, other: &RateLimitedFetcher<G, T>) -> Self {
        Self {
            inner,
            rate_limiter: Arc::clone(&other.rate_limiter),
            _item: PhantomData,
        }
    }

    /// Get a reference to the inner fetcher.
    pub fn inner(&self) -> &F {
        &self.inner
    }

    async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            () = self.rate_limiter.until_ready() => Ok(()),
            () = cancel.cancelled() => Err(FetchError::Cancelled),
        }
    }
}

impl<F: Clone, T> Clone for RateLimitedFetcher<F, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            rate_limiter: Arc::clone(&self.rate_limiter),
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<F, T> PageFetcher<T> for RateLimitedFetcher<F, T>
where
    F: PageFetcher<T>,
    T: Send + 'static,
{
    async fn fetch_page(
        &self,
        page: u32,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<PageResponse<T>> {
        self.wait(cancel).await?;
        self.inner.fetch_page(page, limit, cancel).await
    }
}
