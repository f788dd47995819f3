use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Leading-edge debounce: the first trigger opens a window during which every
/// further trigger is dropped.
///
/// The timestamp moves only when a trigger is accepted, so a burst of events
/// cannot keep pushing the window forward.
#[derive(Debug)]
pub struct Debounce {
    window: Duration,
    last_accepted: Mutex<Option<Instant>>,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check-and-update under one lock. Returns `true` if a trigger at `now`
    /// is accepted, recording `now` as the start of the next window.
    pub fn try_accept(&self, now: Instant) -> bool {
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(prev) = *last
            && now.saturating_duration_since(prev) < self.window
        {
            return false;
        }
        *last = Some(now);
        true
    }
}
