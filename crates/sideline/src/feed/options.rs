use std::collections::BTreeSet;
use std::time::Duration;

use serde::Deserialize;

use crate::fetch::FetchError;

/// Default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Cool-down applied to [`on_end_reached`](super::FeedSynchronizer::on_end_reached).
///
/// List views fire a burst of end-reached callbacks while the user flings
/// towards the bottom; only the first one inside this window is honoured.
pub const END_REACHED_COOLDOWN: Duration = Duration::from_millis(800);

/// Failures that mean "there is nothing more here" rather than "something broke".
///
/// Some endpoints answer an out-of-range page with a client error status. A
/// status listed here turns that answer into an empty last page instead of an
/// error. The set is empty by default; each list decides its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct EmptyPageConditions {
    statuses: BTreeSet<u16>,
}

impl EmptyPageConditions {
    /// No benign statuses.
    pub fn none() -> Self {
        Self::default()
    }

    /// Treat each of `statuses` as an empty last page.
    pub fn statuses(statuses: impl IntoIterator<Item = u16>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
        }
    }

    /// Add one benign status.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.statuses.insert(status);
        self
    }

    /// Whether `error` should be read as an empty last page.
    pub fn matches(&self, error: &FetchError) -> bool {
        match error {
            FetchError::Status { status, .. } => self.statuses.contains(status),
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.statuses.iter().copied()
    }
}

/// Per-feed configuration for a [`FeedSynchronizer`](super::FeedSynchronizer).
#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// Name of the feed in events and logs (e.g. "events", "my-posts").
    pub label: String,
    /// Items requested per page. The engine reads zero as one.
    pub page_size: u32,
    /// Throttle window for end-reached callbacks.
    pub end_reached_cooldown: Duration,
    /// Failures treated as an empty last page.
    pub empty_page_conditions: EmptyPageConditions,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            label: "feed".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            end_reached_cooldown: END_REACHED_COOLDOWN,
            empty_page_conditions: EmptyPageConditions::none(),
        }
    }
}

impl FeedOptions {
    /// Default options with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Set the page size. Zero is bumped to one.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the end-reached throttle window.
    #[must_use]
    pub fn with_end_reached_cooldown(mut self, cooldown: Duration) -> Self {
        self.end_reached_cooldown = cooldown;
        self
    }

    /// Set the benign empty-result conditions.
    #[must_use]
    pub fn with_empty_page_conditions(mut self, conditions: EmptyPageConditions) -> Self {
        self.empty_page_conditions = conditions;
        self
    }
}
