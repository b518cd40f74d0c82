//! Debounce clock for deferred pixel readback.
//!
//! A synchronous readback right after a pick pass forces a full pipeline
//! flush. Instead, each render trigger schedules one deferred sample a short
//! delay later; re-triggering supersedes the previous deadline, so bursts of
//! renders collapse into a single readback once the GPU has drained.

use std::time::{Duration, Instant};

/// Default deferral: roughly one frame at 60 Hz.
pub const DEFAULT_READ_DELAY: Duration = Duration::from_millis(16);

/// Single-slot deadline for the next buffer sample.
#[derive(Debug)]
pub struct ReadbackClock {
    delay: Duration,
    due: Option<Instant>,
}

impl ReadbackClock {
    /// Creates a clock with the given deferral delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay, due: None }
    }

    /// Schedules (or reschedules) the sample for `now + delay`. Any
    /// previously pending deadline is discarded.
    pub fn trigger(&mut self, now: Instant) {
        self.due = Some(now + self.delay);
    }

    /// Consumes the deadline if it has come due. Returns true at most once
    /// per trigger.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }

    /// True while a sample is scheduled.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.due.is_some()
    }

    /// Drops any pending deadline.
    pub fn cancel(&mut self) {
        self.due = None;
    }
}

impl Default for ReadbackClock {
    fn default() -> Self {
        Self::new(DEFAULT_READ_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_delay() {
        let mut clock = ReadbackClock::new(Duration::from_millis(10));
        let t0 = Instant::now();
        clock.trigger(t0);
        assert!(!clock.fire(t0));
        assert!(!clock.fire(t0 + Duration::from_millis(9)));
        assert!(clock.fire(t0 + Duration::from_millis(10)));
        // Consumed: does not fire again without a new trigger.
        assert!(!clock.fire(t0 + Duration::from_millis(20)));
    }

    #[test]
    fn test_retrigger_supersedes() {
        let mut clock = ReadbackClock::new(Duration::from_millis(10));
        let t0 = Instant::now();
        clock.trigger(t0);
        clock.trigger(t0 + Duration::from_millis(5));
        // The first deadline was replaced, not stacked.
        assert!(!clock.fire(t0 + Duration::from_millis(10)));
        assert!(clock.fire(t0 + Duration::from_millis(15)));
        assert!(!clock.fire(t0 + Duration::from_millis(30)));
    }

    #[test]
    fn test_cancel_clears_deadline() {
        let mut clock = ReadbackClock::new(Duration::from_millis(10));
        let t0 = Instant::now();
        clock.trigger(t0);
        assert!(clock.is_scheduled());
        clock.cancel();
        assert!(!clock.is_scheduled());
        assert!(!clock.fire(t0 + Duration::from_secs(1)));
    }
}
