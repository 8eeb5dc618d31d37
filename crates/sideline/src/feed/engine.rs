use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::watch;

use crate::fetch::{CancellationToken, FeedItem, FetchError, Page, PageFetcher};

use super::merge::merge_items;
use super::options::FeedOptions;
use super::outcome::{FetchOutcome, classify};
use super::progress::{FeedEvent, FeedEventCallback, SkipReason, emit};
use super::state::{FeedState, LoadMode};
use super::throttle::Throttle;

/// A dispatched request: who owns the in-flight slot and what it asked for.
///
/// Dropping a ticket that never settled (the operation future was dropped
/// mid-fetch) releases the slot it still holds.
struct Ticket<'a, T, F> {
    engine: &'a FeedSynchronizer<T, F>,
    token: CancellationToken,
    mode: LoadMode,
    page: u32,
    settled: bool,
}

impl<T, F> Drop for Ticket<'_, T, F> {
    fn drop(&mut self) {
        if !self.settled {
            self.engine.abandon(&self.token, self.mode, self.page);
        }
    }
}

/// Keeps one paginated list in sync with its remote source.
///
/// One instance per list on screen. The engine owns the [`FeedState`]; callers
/// drive it through [`load_initial`](Self::load_initial),
/// [`refresh`](Self::refresh), [`load_next_page`](Self::load_next_page) and
/// [`on_end_reached`](Self::on_end_reached), and read it through
/// [`snapshot`](Self::snapshot) or [`subscribe`](Self::subscribe).
///
/// # Concurrency
///
/// At most one fetch is current at a time. The in-flight flag is claimed
/// synchronously, before the first `.await`, so two calls made in the same
/// tick cannot both dispatch:
///
/// - replace-mode loads (initial, refresh) cancel whatever is in flight and
///   take over the slot;
/// - append-mode loads are ignored while anything is in flight.
///
/// A request whose token is no longer current never touches the state, even
/// if its fetch resolves successfully after being superseded.
///
/// # Errors
///
/// None of the operations fail. Cancellations are swallowed, configured
/// benign statuses become an empty last page, and every other failure is
/// stored in [`FeedState::error`] while the loaded items stay as they were.
///
/// # Example
///
/// ```ignore
/// use sideline::feed::{FeedOptions, FeedSynchronizer};
///
/// let feed = FeedSynchronizer::new(fetcher, FeedOptions::new("events"));
/// feed.load_initial().await;
///
/// let mut updates = feed.subscribe();
/// while updates.changed().await.is_ok() {
///     render(&updates.borrow());
/// }
/// ```
pub struct FeedSynchronizer<T, F> {
    fetcher: F,
    options: FeedOptions,
    state: watch::Sender<FeedState<T>>,
    in_flight: AtomicBool,
    current: Mutex<Option<CancellationToken>>,
    end_reached: Throttle,
    on_event: Option<FeedEventCallback>,
}

impl<T, F> FeedSynchronizer<T, F>
where
    T: FeedItem,
    F: PageFetcher<T>,
{
    pub fn new(fetcher: F, mut options: FeedOptions) -> Self {
        options.page_size = options.page_size.max(1);
        let (state, _rx) = watch::channel(FeedState::default());
        let end_reached = Throttle::new(options.end_reached_cooldown);

        Self {
            fetcher,
            options,
            state,
            in_flight: AtomicBool::new(false),
            current: Mutex::new(None),
            end_reached,
            on_event: None,
        }
    }

    /// Receive [`FeedEvent`]s for everything this feed does.
    #[must_use]
    pub fn with_event_callback(mut self, on_event: FeedEventCallback) -> Self {
        self.on_event = Some(on_event);
        self
    }

    pub fn options(&self) -> &FeedOptions {
        &self.options
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> FeedState<T> {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<FeedState<T>> {
        self.state.subscribe()
    }

    /// Whether a fetch currently holds the in-flight slot.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Load page 1, replacing the current items. Used on mount.
    pub async fn load_initial(&self) {
        let ticket = self.begin_replace(LoadMode::Initial);
        self.run(ticket).await;
    }

    /// User-initiated reload of page 1.
    ///
    /// Same as [`load_initial`](Self::load_initial) but also raises
    /// `is_refreshing`, and reopens the end-reached throttle window.
    pub async fn refresh(&self) {
        self.end_reached.reset();
        let ticket = self.begin_replace(LoadMode::Refresh);
        self.run(ticket).await;
    }

    /// Load the page after the last loaded one and merge it in.
    ///
    /// Does nothing when nothing is loaded yet, when a load is in flight, or
    /// when the last page has been reached.
    pub async fn load_next_page(&self) {
        if let Some(ticket) = self.begin_append() {
            self.run(ticket).await;
        }
    }

    /// Throttled [`load_next_page`](Self::load_next_page) for list-end callbacks.
    ///
    /// Calls within [`FeedOptions::end_reached_cooldown`] of the previous
    /// accepted call are ignored.
    pub async fn on_end_reached(&self) {
        if !self.end_reached.try_accept() {
            self.skip(SkipReason::Throttled);
            return;
        }
        self.load_next_page().await;
    }

    /// Tear down: cancel the in-flight request, if any, and go idle.
    ///
    /// The cancelled request's eventual result is discarded. Dropping the
    /// engine does the same.
    pub fn dispose(&self) {
        let mut current = self.lock_current();
        let Some(token) = current.take() else {
            return;
        };
        token.cancel();
        self.in_flight.store(false, Ordering::Release);
        self.state.send_modify(|s| {
            s.is_loading = false;
            s.is_refreshing = false;
            s.has_next_page = s.confirmed_has_next_page;
        });
        tracing::debug!(feed = %self.options.label, "Feed disposed, in-flight request cancelled");
    }

    fn skip(&self, reason: SkipReason) {
        emit(
            self.on_event.as_ref(),
            FeedEvent::Skipped {
                feed: self.options.label.clone(),
                reason,
            },
        );
    }

    /// Claim the in-flight slot for a page-1 load, cancelling whatever held it.
    fn begin_replace(&self, mode: LoadMode) -> Ticket<'_, T, F> {
        let token = CancellationToken::new();

        let mut current = self.lock_current();
        if let Some(previous) = current.replace(token.clone()) {
            previous.cancel();
            tracing::debug!(feed = %self.options.label, mode = %mode, "Cancelled in-flight request");
        }
        self.in_flight.store(true, Ordering::Release);

        self.state.send_modify(|s| {
            s.is_loading = true;
            s.is_refreshing = mode == LoadMode::Refresh;
            s.has_next_page = true;
        });
        drop(current);

        Ticket {
            engine: self,
            token,
            mode,
            page: 1,
            settled: false,
        }
    }

    /// Claim the in-flight slot for the next page, or explain why not.
    fn begin_append(&self) -> Option<Ticket<'_, T, F>> {
        if self.in_flight.load(Ordering::Acquire) {
            self.skip(SkipReason::InFlight);
            return None;
        }

        let mut current = self.lock_current();
        if current.is_some() || self.in_flight.load(Ordering::Acquire) {
            drop(current);
            self.skip(SkipReason::InFlight);
            return None;
        }

        let next = {
            let state = self.state.borrow();
            if state.items.is_empty() {
                Err(SkipReason::NoItems)
            } else if !state.has_next_page {
                Err(SkipReason::EndOfList)
            } else {
                Ok(state.page + 1)
            }
        };

        let page = match next {
            Ok(page) => page,
            Err(reason) => {
                drop(current);
                self.skip(reason);
                return None;
            }
        };

        let token = CancellationToken::new();
        *current = Some(token.clone());
        self.in_flight.store(true, Ordering::Release);
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.is_refreshing = false;
        });
        drop(current);

        Some(Ticket {
            engine: self,
            token,
            mode: LoadMode::Append,
            page,
            settled: false,
        })
    }

    async fn run(&self, ticket: Ticket<'_, T, F>) {
        emit(
            self.on_event.as_ref(),
            FeedEvent::LoadStarted {
                feed: self.options.label.clone(),
                mode: ticket.mode,
                page: ticket.page,
            },
        );

        let limit = self.options.page_size;
        let result = tokio::select! {
            biased;
            result = self.fetcher.fetch_page(ticket.page, limit, &ticket.token) => result,
            () = ticket.token.cancelled() => Err(FetchError::Cancelled),
        };

        let outcome = classify(
            result,
            ticket.page,
            limit,
            &self.options.empty_page_conditions,
        );
        self.settle(ticket, outcome);
    }

    /// Apply a settled request to the state, if it is still the current one.
    fn settle(&self, mut ticket: Ticket<'_, T, F>, outcome: FetchOutcome<T>) {
        ticket.settled = true;
        let feed = self.options.label.clone();
        let (token, mode, page) = (&ticket.token, ticket.mode, ticket.page);

        let mut current = self.lock_current();
        let is_current = current.as_ref().is_some_and(|t| t.same_as(token));
        if !is_current {
            drop(current);
            tracing::debug!(feed = %feed, mode = %mode, page, "Discarding superseded result");
            emit(
                self.on_event.as_ref(),
                FeedEvent::Superseded { feed, mode, page },
            );
            return;
        }
        *current = None;

        let event = match outcome {
            FetchOutcome::Loaded(loaded) => {
                let count = loaded.items.len();
                let (total_items, has_next_page) = self.apply_page(mode, loaded);
                FeedEvent::PageLoaded {
                    feed,
                    mode,
                    page,
                    count,
                    total_items,
                    has_next_page,
                }
            }
            FetchOutcome::Empty { status } => {
                self.apply_page(mode, Page::empty(page));
                FeedEvent::EmptyPage {
                    feed,
                    mode,
                    page,
                    status,
                }
            }
            FetchOutcome::Cancelled => {
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.is_refreshing = false;
                    s.has_next_page = s.confirmed_has_next_page;
                });
                FeedEvent::Cancelled { feed, mode, page }
            }
            FetchOutcome::Failed(error) => {
                let message = error.to_string();
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.is_refreshing = false;
                    s.has_next_page = s.confirmed_has_next_page;
                    s.last_error = Some(error);
                });
                FeedEvent::Failed {
                    feed,
                    mode,
                    page,
                    error: message,
                }
            }
        };

        self.in_flight.store(false, Ordering::Release);
        drop(current);

        emit(self.on_event.as_ref(), event);
    }

    /// Merge a page into the state in one transition. Returns the resulting
    /// item count and `has_next_page`.
    fn apply_page(&self, mode: LoadMode, page: Page<T>) -> (usize, bool) {
        let append = !mode.is_replace();
        let mut summary = (0, false);

        self.state.send_modify(|s| {
            s.items = merge_items(&s.items, page.items, append);
            s.page = page.current_page;
            s.has_next_page = page.has_next_page;
            s.confirmed_has_next_page = page.has_next_page;
            s.total_count = if append {
                page.total_count.or(s.total_count)
            } else {
                page.total_count
            };
            s.last_error = None;
            s.last_loaded_at = Some(Utc::now());
            s.is_loading = false;
            s.is_refreshing = false;
            summary = (s.items.len(), s.has_next_page);
        });

        summary
    }
}

impl<T, F> FeedSynchronizer<T, F> {
    fn lock_current(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Release the slot held by a request whose operation was dropped before
    /// it settled. A request that was already superseded holds nothing.
    fn abandon(&self, token: &CancellationToken, mode: LoadMode, page: u32) {
        token.cancel();

        let mut current = self.lock_current();
        if !current.as_ref().is_some_and(|t| t.same_as(token)) {
            return;
        }
        *current = None;
        self.state.send_modify(|s| {
            s.is_loading = false;
            s.is_refreshing = false;
            s.has_next_page = s.confirmed_has_next_page;
        });
        self.in_flight.store(false, Ordering::Release);
        drop(current);

        tracing::debug!(
            feed = %self.options.label,
            mode = %mode,
            page,
            "Load dropped before settling, in-flight request cancelled"
        );
        emit(
            self.on_event.as_ref(),
            FeedEvent::Cancelled {
                feed: self.options.label.clone(),
                mode,
                page,
            },
        );
    }
}

impl<T, F> Drop for FeedSynchronizer<T, F> {
    fn drop(&mut self) {
        let current = self.current.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = current.take() {
            token.cancel();
        }
    }
}
