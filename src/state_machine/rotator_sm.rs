//! News rotation state machine.
//!
//! ```text
//! Idle ──Adopt──▶ Rotating ──Adopt──▶ Rotating (index 0, phase restarted)
//!   │                 │
//!   └───Teardown──────┴──▶ Stopped (terminal)
//! ```
//!
//! Time is supplied with each event; the machine owns a `PeriodicTimer` and
//! never schedules anything on its own.

use statig::prelude::*;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::ticker::timer::PeriodicTimer;

/// Cadence at which the headline advances.
pub const DEFAULT_ROTATION_PERIOD: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum RotatorEvent {
    /// The store adopted a news list of `len` items at `now`.
    Adopt { len: usize, now: Instant },
    /// Frame poll.
    Tick { now: Instant },
    /// Widget unmounted.
    Teardown,
}

// ---------------------------------------------------------------------------
// Shared storage
// ---------------------------------------------------------------------------

pub struct RotatorMachine {
    timer: PeriodicTimer,
}

impl RotatorMachine {
    pub fn new(period: Duration) -> Self {
        Self {
            timer: PeriodicTimer::new(period),
        }
    }
}

// ---------------------------------------------------------------------------
// State machine implementation
// ---------------------------------------------------------------------------

#[state_machine(initial = "State::idle()", state(derive(Debug, Clone, PartialEq)))]
impl RotatorMachine {
    /// No list adopted yet.
    #[state]
    fn idle(&mut self, event: &RotatorEvent) -> Outcome<State> {
        match event {
            RotatorEvent::Adopt { len, now } if *len > 0 => self.restart(*len, *now),
            RotatorEvent::Teardown => Transition(State::stopped(None)),
            _ => Handled,
        }
    }

    /// Advancing `index` through a list of `len` items.
    #[state]
    fn rotating(&mut self, event: &RotatorEvent, index: &mut usize, len: &usize) -> Outcome<State> {
        match event {
            RotatorEvent::Tick { now } => {
                let steps = self.timer.fire(*now) as usize;
                if steps > 0 {
                    *index = (*index + steps % *len) % *len;
                    debug!(target: "rotator", index = *index, len = *len, "Headline advanced");
                }
                Handled
            }
            RotatorEvent::Adopt { len, now } if *len > 0 => self.restart(*len, *now),
            RotatorEvent::Adopt { .. } => Handled,
            RotatorEvent::Teardown => {
                self.timer.cancel();
                Transition(State::stopped(Some(*index)))
            }
        }
    }

    /// Terminal. `frozen` is the index shown at teardown, if any.
    #[state]
    fn stopped(&mut self, event: &RotatorEvent, frozen: &Option<usize>) -> Outcome<State> {
        let _ = (event, frozen);
        Handled
    }
}

impl RotatorMachine {
    fn restart(&mut self, len: usize, now: Instant) -> Outcome<State> {
        self.timer.start(now);
        debug!(target: "rotator", len, "Rotation (re)started");
        Transition(State::rotating(0, len))
    }
}

// ---------------------------------------------------------------------------
// Facade
// ---------------------------------------------------------------------------

/// Owns the rotation state machine and exposes the display index.
pub struct NewsRotator {
    machine: StateMachine<RotatorMachine>,
}

impl NewsRotator {
    pub fn new(period: Duration) -> Self {
        Self {
            machine: RotatorMachine::new(period).state_machine(),
        }
    }

    /// Start (or restart) rotation over a freshly adopted list.
    pub fn adopt(&mut self, len: usize, now: Instant) {
        self.machine.handle(&RotatorEvent::Adopt { len, now });
    }

    pub fn tick(&mut self, now: Instant) {
        self.machine.handle(&RotatorEvent::Tick { now });
    }

    pub fn teardown(&mut self) {
        self.machine.handle(&RotatorEvent::Teardown);
    }

    /// Index into the adopted list; `None` before any adoption.
    pub fn display_index(&self) -> Option<usize> {
        match self.machine.state() {
            State::Idle {} => None,
            State::Rotating { index, .. } => Some(*index),
            State::Stopped { frozen } => *frozen,
        }
    }

    pub fn is_rotating(&self) -> bool {
        matches!(self.machine.state(), State::Rotating { .. })
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.machine.state(), State::Stopped { .. })
    }
}

impl Default for NewsRotator {
    fn default() -> Self {
        Self::new(DEFAULT_ROTATION_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = DEFAULT_ROTATION_PERIOD;

    #[test]
    fn idle_until_first_adoption() {
        let mut rotator = NewsRotator::default();
        let t0 = Instant::now();
        rotator.tick(t0 + PERIOD * 3);
        assert_eq!(rotator.display_index(), None);
        assert!(!rotator.is_rotating());
    }

    #[test]
    fn empty_adoption_keeps_idle() {
        let mut rotator = NewsRotator::default();
        rotator.adopt(0, Instant::now());
        assert_eq!(rotator.display_index(), None);
    }

    #[test]
    fn index_after_k_ticks_is_k_mod_n() {
        let t0 = Instant::now();
        for n in 1..=4usize {
            let mut rotator = NewsRotator::new(PERIOD);
            rotator.adopt(n, t0);
            assert_eq!(rotator.display_index(), Some(0));
            for k in 1..=9u32 {
                rotator.tick(t0 + PERIOD * k);
                assert_eq!(rotator.display_index(), Some(k as usize % n), "n={n} k={k}");
            }
        }
    }

    #[test]
    fn ticks_between_periods_do_not_advance() {
        let t0 = Instant::now();
        let mut rotator = NewsRotator::new(PERIOD);
        rotator.adopt(3, t0);
        rotator.tick(t0 + Duration::from_secs(4));
        rotator.tick(t0 + Duration::from_secs(9));
        assert_eq!(rotator.display_index(), Some(0));
    }

    #[test]
    fn late_tick_advances_by_elapsed_periods() {
        let t0 = Instant::now();
        let mut rotator = NewsRotator::new(PERIOD);
        rotator.adopt(3, t0);
        rotator.tick(t0 + Duration::from_secs(41));
        assert_eq!(rotator.display_index(), Some(1));
    }

    #[test]
    fn readoption_resets_index_and_phase() {
        let t0 = Instant::now();
        let mut rotator = NewsRotator::new(PERIOD);
        rotator.adopt(3, t0);
        rotator.tick(t0 + PERIOD);
        assert_eq!(rotator.display_index(), Some(1));

        let t1 = t0 + Duration::from_secs(15);
        rotator.adopt(2, t1);
        assert_eq!(rotator.display_index(), Some(0));
        // Old phase (t0 + 20s) must not fire.
        rotator.tick(t0 + PERIOD * 2);
        assert_eq!(rotator.display_index(), Some(0));
        rotator.tick(t1 + PERIOD);
        assert_eq!(rotator.display_index(), Some(1));
    }

    #[test]
    fn teardown_freezes_index_and_ignores_events() {
        let t0 = Instant::now();
        let mut rotator = NewsRotator::new(PERIOD);
        rotator.adopt(3, t0);
        rotator.tick(t0 + PERIOD);
        rotator.teardown();
        assert!(rotator.is_stopped());

        rotator.tick(t0 + PERIOD * 5);
        rotator.adopt(4, t0 + PERIOD * 6);
        assert_eq!(rotator.display_index(), Some(1));
        assert!(rotator.is_stopped());
    }

    #[test]
    fn teardown_from_idle_has_no_index() {
        let mut rotator = NewsRotator::default();
        rotator.teardown();
        assert!(rotator.is_stopped());
        assert_eq!(rotator.display_index(), None);
    }
}
