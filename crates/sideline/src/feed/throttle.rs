use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Leading-edge throttle: accepts a call, then rejects everything until the
/// cool-down has elapsed since that accepted call.
#[derive(Debug)]
pub struct Throttle {
    cooldown: Duration,
    last_accepted: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_accepted: Mutex::new(None),
        }
    }

    /// Accept the call if the window has elapsed, restarting the window.
    pub fn try_accept(&self) -> bool {
        let now = Instant::now();
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        if let Some(previous) = *last
            && now.duration_since(previous) < self.cooldown
        {
            return false;
        }

        *last = Some(now);
        true
    }

    /// Forget the last accepted call so the next one goes through.
    pub fn reset(&self) {
        *self
            .last_accepted
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}
