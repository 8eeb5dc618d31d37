use std::sync::Arc;

use tokio::sync::watch;

use super::errors::FetchError;

/// Cooperative cancellation signal shared between the engine and a fetcher.
///
/// Clones share the same underlying signal. Two tokens are the *same* token
/// only if one was cloned from the other; [`CancellationToken::same_as`] is how
/// the engine decides whether a settling request is still the current one.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            inner: Arc::new(tx),
        }
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.send_replace(true);
    }

    /// Whether [`cancel`](Self::cancel) has been called on this token or a clone.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        *self.inner.borrow()
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.inner.subscribe();
        // The sender lives as long as `self`, so this can only fail if it was dropped.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Identity comparison: true when both handles point at the same signal.
    #[inline]
    pub fn same_as(&self, other: &CancellationToken) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Return `Err(FetchError::Cancelled)` if the token has fired.
    ///
    /// Fetchers call this at their own checkpoints so a cancelled request never
    /// resolves with stale data.
    pub fn check(&self) -> Result<(), FetchError> {
        if self.is_cancelled() {
            Err(FetchError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn new_token_is_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(FetchError::Cancelled));
    }

    #[test]
    fn identity_follows_clones_not_state() {
        let a = CancellationToken::new();
        let b = CancellationToken::new();
        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
    }

    #[tokio::test]
    async fn cancelled_resolves_after_cancel() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        tokio::task::yield_now().await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("cancelled() should resolve")
            .expect("waiter task");
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_millis(50), token.cancelled())
            .await
            .expect("already-cancelled token resolves at once");
    }
}
