//! Rate-limit retry for page fetchers.
//!
//! The feed engine never retries; a fetcher may. [`with_retry`] retries a
//! request only while the server keeps answering "rate limited", backing off
//! exponentially (or for as long as the server's `Retry-After` asks, capped at
//! the configured maximum), and gives up at once when the request is cancelled.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::fetch::{CancellationToken, FetchError, Result};

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 500;

/// Maximum backoff delay in milliseconds when rate limited.
pub const MAX_BACKOFF_MS: u64 = 10_000;

/// Maximum retries for a single page request.
pub const MAX_PAGE_RETRIES: usize = 3;

/// Configuration for retry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Minimum delay between retries.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of retry attempts.
    pub max_retries: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: MAX_PAGE_RETRIES,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom values.
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            with_jitter: true,
        }
    }

    /// Never retry.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

/// Run `operation`, retrying rate-limit failures with exponential backoff.
///
/// - Only [`FetchError::RateLimited`] is retried; every other error is
///   returned as-is on the first attempt.
/// - A fired `cancel` token ends the loop immediately, including while
///   sleeping between attempts, with [`FetchError::Cancelled`].
///
/// # Example
///
/// ```ignore
/// use sideline::retry::{with_retry, RetryConfig};
///
/// let page = with_retry(
///     || async { fetch_once(page, limit).await },
///     &RetryConfig::default(),
///     &cancel,
///     "events",
/// ).await?;
/// ```
pub async fn with_retry<T, F, Fut>(
    mut operation: F,
    config: &RetryConfig,
    cancel: &CancellationToken,
    label: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    cancel.check()?;

    // Track attempt number for logging
    let attempt = AtomicU32::new(0);

    let retry_op = || {
        attempt.fetch_add(1, Ordering::SeqCst);
        operation()
    };

    let retrying = retry_op
        .retry(config.clone().into_backoff())
        .adjust(|err: &FetchError, dur: Option<Duration>| {
            retry_delay(err, dur, config.max_delay)
        })
        .notify(|err: &FetchError, dur: Duration| {
            tracing::debug!(
                feed = %label,
                retry_in = ?dur,
                attempt = attempt.load(Ordering::SeqCst),
                error = %err,
                "Rate limited, retrying page request"
            );
        })
        .when(|err: &FetchError| err.is_rate_limited() && !cancel.is_cancelled());

    tokio::select! {
        result = retrying => result,
        () = cancel.cancelled() => Err(FetchError::Cancelled),
    }
}

/// The wait before the next attempt: the server's `Retry-After` when it sent
/// one, otherwise the backoff's own delay. `None` means retries are exhausted.
fn retry_delay(
    err: &FetchError,
    backoff: Option<Duration>,
    max_delay: Duration,
) -> Option<Duration> {
    let backoff = backoff?;
    match err {
        FetchError::RateLimited {
            retry_after: Some(after),
        } => Some((*after).min(max_delay)),
        _ => Some(backoff),
    }
}
