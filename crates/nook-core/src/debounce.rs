//! Single-slot trailing-edge debouncer
//!
//! Bounds how often a stream of events commits work without dropping the
//! final state: each arrival replaces the pending payload and re-arms the
//! timer, and the payload fires once a full quiet window has passed since
//! the last arrival. One slot, no queue: intermediate payloads coalesce
//! away.
//!
//! The debouncer is driven by caller-supplied [`Instant`]s rather than a
//! runtime timer, so sessions (and tests) control time explicitly.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    slot: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, slot: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending payload and restart the quiet window.
    pub fn push(&mut self, value: T, now: Instant) {
        self.slot = Some((value, now));
    }

    /// Take the payload if the quiet window has elapsed since the last
    /// push. Returns `None` while still waiting (or when idle).
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.slot {
            Some((_, armed_at)) if now.duration_since(*armed_at) >= self.delay => {
                self.slot.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    /// Take the pending payload immediately, ignoring the timer.
    pub fn flush(&mut self) -> Option<T> {
        self.slot.take().map(|(value, _)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_trailing_edge_coalescing() {
        let mut debouncer = Debouncer::new(ms(500));
        let t0 = Instant::now();

        // Events at t=0, 100, 200, 300 ms
        for (at, payload) in [(0, "a"), (100, "b"), (200, "c"), (300, "d")] {
            debouncer.push(payload, t0 + ms(at));
        }

        // Nothing fires while events keep arriving or before the window
        assert_eq!(debouncer.poll(t0 + ms(300)), None);
        assert_eq!(debouncer.poll(t0 + ms(799)), None);

        // Exactly one commit at t=300+500, carrying the last payload
        assert_eq!(debouncer.poll(t0 + ms(800)), Some("d"));
        assert_eq!(debouncer.poll(t0 + ms(2000)), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_push_rearms_window() {
        let mut debouncer = Debouncer::new(ms(500));
        let t0 = Instant::now();

        debouncer.push(1, t0);
        assert_eq!(debouncer.poll(t0 + ms(499)), None);

        // A new arrival just before the deadline pushes it out
        debouncer.push(2, t0 + ms(499));
        assert_eq!(debouncer.poll(t0 + ms(500)), None);
        assert_eq!(debouncer.poll(t0 + ms(999)), Some(2));
    }

    #[test]
    fn test_flush_takes_immediately() {
        let mut debouncer = Debouncer::new(ms(500));
        let t0 = Instant::now();

        assert_eq!(debouncer.flush(), None);
        debouncer.push("pending", t0);
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.flush(), Some("pending"));
        assert!(!debouncer.is_pending());
    }
}
