//! The paginated feed synchronization engine.
//!
//! Every paginated list in the app (events feed, matches, my posts, my
//! matches, groups, pending requests) is backed by one [`FeedSynchronizer`].
//! The engine handles incremental pagination, cancellation of superseded
//! requests, de-duplication across pages, overlap guarding and the
//! cancelled / benign-empty / failed classification of fetch outcomes.

mod engine;
mod merge;
mod options;
mod outcome;
mod progress;
mod state;
mod throttle;

pub use engine::FeedSynchronizer;
pub use merge::merge_items;
pub use options::{DEFAULT_PAGE_SIZE, END_REACHED_COOLDOWN, EmptyPageConditions, FeedOptions};
pub use outcome::{FetchOutcome, classify};
pub use progress::{FeedEvent, FeedEventCallback, SkipReason, emit};
pub use state::{FeedState, LoadMode};
pub use throttle::Throttle;
