//! Events emitted by a feed engine while it works.
//!
//! Events are informational only; a callback never changes what the engine
//! does. The CLI turns them into structured log lines.

use super::state::LoadMode;

/// Why a call was ignored without dispatching a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another load is in flight.
    InFlight,
    /// Nothing has been loaded yet, so there is no "next" page.
    NoItems,
    /// The last page has already been loaded.
    EndOfList,
    /// An end-reached call arrived inside the throttle window.
    Throttled,
}

/// Progress events emitted during feed loads.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum FeedEvent {
    /// A fetch was dispatched.
    LoadStarted {
        feed: String,
        mode: LoadMode,
        page: u32,
    },

    /// A page landed and was merged into the feed.
    PageLoaded {
        feed: String,
        mode: LoadMode,
        page: u32,
        /// Items on this page.
        count: usize,
        /// Items in the feed after the merge.
        total_items: usize,
        has_next_page: bool,
    },

    /// The server answered with a status configured as "no more data".
    EmptyPage {
        feed: String,
        mode: LoadMode,
        page: u32,
        status: u16,
    },

    /// The current request was cancelled; state was left as it was.
    Cancelled {
        feed: String,
        mode: LoadMode,
        page: u32,
    },

    /// A request that is no longer current settled and its result was dropped.
    Superseded {
        feed: String,
        mode: LoadMode,
        page: u32,
    },

    /// The fetch genuinely failed.
    Failed {
        feed: String,
        mode: LoadMode,
        page: u32,
        error: String,
    },

    /// A call was ignored.
    Skipped { feed: String, reason: SkipReason },
}

/// Callback for feed events.
pub type FeedEventCallback = Box<dyn Fn(FeedEvent) + Send + Sync>;

/// Emit an event if a callback is provided.
#[inline]
pub fn emit(on_event: Option<&FeedEventCallback>, event: FeedEvent) {
    if let Some(cb) = on_event {
        cb(event);
    }
}
