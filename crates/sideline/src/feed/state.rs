use chrono::{DateTime, Utc};

use crate::fetch::FetchError;

/// Which kind of load an operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadMode {
    /// Page 1, replacing the current items (on mount).
    Initial,
    /// Page 1, replacing the current items, with the refresh indicator on.
    Refresh,
    /// The page after the last loaded one, merged into the current items.
    Append,
}

impl LoadMode {
    /// Whether the result replaces the current items.
    #[inline]
    pub fn is_replace(self) -> bool {
        !matches!(self, LoadMode::Append)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LoadMode::Initial => "initial",
            LoadMode::Refresh => "refresh",
            LoadMode::Append => "append",
        }
    }
}

impl std::fmt::Display for LoadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only snapshot of a feed.
///
/// Only the owning [`FeedSynchronizer`](super::FeedSynchronizer) changes this;
/// callers get clones through `snapshot()` or a `watch` subscription.
#[derive(Debug, Clone)]
pub struct FeedState<T> {
    pub(crate) items: Vec<T>,
    pub(crate) page: u32,
    pub(crate) is_loading: bool,
    pub(crate) is_refreshing: bool,
    pub(crate) has_next_page: bool,
    /// `has_next_page` as of the last successful load; restored when a load
    /// that optimistically reset it fails or is cancelled.
    pub(crate) confirmed_has_next_page: bool,
    pub(crate) last_error: Option<FetchError>,
    pub(crate) total_count: Option<u64>,
    pub(crate) last_loaded_at: Option<DateTime<Utc>>,
}

impl<T> Default for FeedState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            is_loading: false,
            is_refreshing: false,
            has_next_page: true,
            confirmed_has_next_page: true,
            last_error: None,
            total_count: None,
            last_loaded_at: None,
        }
    }
}

impl<T> FeedState<T> {
    /// Loaded items, unique by id, in merge order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Last successfully loaded page number (0 before the first load).
    pub fn page(&self) -> u32 {
        self.page
    }

    /// A fetch of any kind is in flight.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// A user-triggered refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.is_refreshing
    }

    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    /// The last genuine failure, cleared by the next successful load.
    pub fn error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    /// Total number of records, when the server reports it.
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// When the last successful load landed.
    pub fn last_loaded_at(&self) -> Option<DateTime<Utc>> {
        self.last_loaded_at
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the snapshot, keeping only the items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
