use std::time::Duration;

use thiserror::Error;

/// Errors a [`PageFetcher`](super::PageFetcher) can fail with.
///
/// The engine sorts these into three buckets: cancellation (swallowed),
/// configured benign statuses (treated as an empty last page) and genuine
/// failures (surfaced through the feed state).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request was superseded or its owner was torn down.
    #[error("Request cancelled")]
    Cancelled,

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },

    /// Network or connection error.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The response body could not be decoded.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Unexpected/internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Message fragments transports conventionally use for aborted requests.
const CANCELLATION_MARKERS: &[&str] = &["canceled", "cancelled", "aborted"];

impl FetchError {
    /// Create a status error.
    #[inline]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Create a network error.
    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an internal error.
    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error means "the request was cancelled" rather than "the
    /// request failed".
    ///
    /// Besides the explicit [`FetchError::Cancelled`] variant, transport errors
    /// whose message carries a conventional cancellation marker also count.
    pub fn is_cancellation(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Network { message } | Self::Internal { message } => {
                let lower = message.to_ascii_lowercase();
                CANCELLATION_MARKERS.iter().any(|m| lower.contains(m))
            }
            _ => false,
        }
    }

    /// Check if this error is a rate limit error (retryable).
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// The HTTP status carried by this error, if any.
    #[inline]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
