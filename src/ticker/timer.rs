//! Deadline-based periodic timer polled from the UI thread.
//!
//! The widget never runs callbacks off the event loop: each frame passes the
//! current `Instant` in and asks how many periods have elapsed since the last
//! poll. Cancelling simply forgets the deadline.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicTimer {
    period: Duration,
    next_due: Option<Instant>,
}

impl PeriodicTimer {
    /// A zero period is bumped to one millisecond so `fire` always terminates.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Arm (or re-arm) the timer; the first firing is one full period after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Number of periods that elapsed up to `now`, advancing the deadline past them.
    ///
    /// Returns 0 for a cancelled timer. The phase is preserved: firing late
    /// does not shift later deadlines.
    pub fn fire(&mut self, now: Instant) -> u32 {
        let Some(due) = self.next_due else {
            return 0;
        };
        if now < due {
            return 0;
        }
        let overdue = now.duration_since(due);
        let extra = overdue.as_nanos() / self.period.as_nanos();
        let fired = (extra + 1).min(u32::MAX as u128) as u32;
        self.next_due = Some(due + self.period * fired);
        fired
    }
}
