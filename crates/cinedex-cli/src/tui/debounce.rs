//! Search input debouncer.

use std::time::{Duration, Instant};

/// Quiet period before a pending search fires.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Coalesces rapid triggers into a single action after a quiet period.
///
/// Holds at most the latest pending value: re-arming replaces the previous
/// value and pushes the deadline out, so a burst of keystrokes yields
/// exactly one fetch once the input goes quiet. Never queues duplicates.
#[derive(Debug)]
pub struct Debouncer<T> {
    /// Quiet period.
    delay: Duration,
    /// Latest pending value and its fire deadline.
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    /// Creates a debouncer with the given quiet period.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Arms (or re-arms) the debouncer with the latest value.
    pub fn arm(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now.checked_add(self.delay).unwrap_or(now)));
    }

    /// Yields the pending value once its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Whether a value is waiting to fire.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
