use sideline::{FeedEvent, FeedEventCallback, SkipReason};

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    /// Wrap this reporter as an engine event callback.
    pub fn into_callback(self) -> FeedEventCallback {
        Box::new(move |event| self.handle(event))
    }

    pub fn handle(&self, event: FeedEvent) {
        match event {
            FeedEvent::LoadStarted { feed, mode, page } => {
                tracing::debug!(feed = %feed, mode = %mode, page, "Loading page");
            }

            FeedEvent::PageLoaded {
                feed,
                mode,
                page,
                count,
                total_items,
                has_next_page,
            } => {
                tracing::info!(
                    feed = %feed,
                    mode = %mode,
                    page,
                    count,
                    total_items,
                    has_next_page,
                    "Loaded page"
                );
            }

            FeedEvent::EmptyPage {
                feed, page, status, ..
            } => {
                tracing::info!(feed = %feed, page, status, "No more data");
            }

            FeedEvent::Cancelled { feed, mode, page } => {
                tracing::debug!(feed = %feed, mode = %mode, page, "Load cancelled");
            }

            FeedEvent::Superseded { feed, mode, page } => {
                tracing::debug!(feed = %feed, mode = %mode, page, "Dropped superseded result");
            }

            FeedEvent::Failed {
                feed,
                mode,
                page,
                error,
            } => {
                tracing::warn!(feed = %feed, mode = %mode, page, error = %error, "Failed to load page");
            }

            FeedEvent::Skipped { feed, reason } => match reason {
                SkipReason::EndOfList => {
                    tracing::debug!(feed = %feed, "Already at the end of the list");
                }
                other => {
                    tracing::trace!(feed = %feed, reason = ?other, "Skipped load");
                }
            },

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
