// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! Trailing-edge debounce for "mask changed" signals.
//!
//! The debouncer only tracks a deadline. The event loop sleeps until
//! [`Debouncer::deadline`] and then calls [`Debouncer::poll`], so the timer
//! lives on the same scheduler as the rest of the session state.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// (Re)schedule the fire for `now + interval`, replacing any pending one.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    /// Drop the pending fire, if any.
    pub fn cancel_pending(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true exactly once when the quiet interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(crate::settings::debounce::INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(400);

    #[test]
    fn test_single_trigger_fires_after_interval() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(INTERVAL);

        debouncer.trigger(start);
        assert!(!debouncer.poll(start + Duration::from_millis(399)));
        assert!(debouncer.poll(start + INTERVAL));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_burst_fires_once_at_last_trigger_plus_interval() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(INTERVAL);

        let mut last = start;
        for i in 0..10 {
            last = start + Duration::from_millis(i * 100);
            debouncer.trigger(last);
            // Nothing fires while triggers keep arriving
            assert!(!debouncer.poll(last));
        }

        assert_eq!(debouncer.deadline(), Some(last + INTERVAL));
        assert!(!debouncer.poll(last + INTERVAL - Duration::from_millis(1)));

        let mut fires = 0;
        for ms in 0..2000 {
            if debouncer.poll(last + Duration::from_millis(ms)) {
                fires += 1;
            }
        }
        assert_eq!(fires, 1);
    }

    #[test]
    fn test_cancel_pending_suppresses_fire() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(INTERVAL);

        debouncer.trigger(start);
        debouncer.cancel_pending();

        assert!(debouncer.deadline().is_none());
        assert!(!debouncer.poll(start + INTERVAL * 4));
    }

    #[test]
    fn test_default_uses_settings_interval() {
        let debouncer = Debouncer::default();
        assert_eq!(debouncer.interval(), Duration::from_millis(400));
    }
}
