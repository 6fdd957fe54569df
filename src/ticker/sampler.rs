//! Decides when the current energy is appended to the trend history.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::timer::PeriodicTimer;

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleMode {
    /// One sample per snapshot carrying a valid energy value.
    Snapshot,
    /// One sample per elapsed interval, armed by the first accepted snapshot.
    #[default]
    Interval,
}

#[derive(Debug, Clone)]
pub struct TrendSampler {
    mode: SampleMode,
    timer: PeriodicTimer,
    cancelled: bool,
}

impl TrendSampler {
    pub fn new(mode: SampleMode, interval: Duration) -> Self {
        Self {
            mode,
            timer: PeriodicTimer::new(interval),
            cancelled: false,
        }
    }

    pub fn mode(&self) -> SampleMode {
        self.mode
    }

    /// Samples due because a snapshot with a valid energy was applied at `now`.
    pub fn on_snapshot(&mut self, now: Instant) -> u32 {
        if self.cancelled {
            return 0;
        }
        match self.mode {
            SampleMode::Snapshot => 1,
            SampleMode::Interval if !self.timer.is_armed() => {
                self.timer.start(now);
                1
            }
            SampleMode::Interval => 0,
        }
    }

    /// Samples due from the independent cadence at `now`.
    ///
    /// At most one: periods missed during a stall are skipped, since no
    /// energy was observed for them.
    pub fn on_tick(&mut self, now: Instant) -> u32 {
        match self.mode {
            SampleMode::Interval => self.timer.fire(now).min(1),
            SampleMode::Snapshot => 0,
        }
    }

    /// Next interval deadline, if the cadence is armed.
    pub fn next_due(&self) -> Option<Instant> {
        self.timer.next_due()
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.timer.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl Default for TrendSampler {
    fn default() -> Self {
        Self::new(SampleMode::default(), DEFAULT_SAMPLE_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(1);

    #[test]
    fn snapshot_mode_samples_every_snapshot() {
        let t0 = Instant::now();
        let mut sampler = TrendSampler::new(SampleMode::Snapshot, INTERVAL);
        assert_eq!(sampler.on_snapshot(t0), 1);
        assert_eq!(sampler.on_snapshot(t0), 1);
        assert_eq!(sampler.on_tick(t0 + INTERVAL * 10), 0);
    }

    #[test]
    fn interval_mode_waits_for_first_snapshot() {
        let t0 = Instant::now();
        let mut sampler = TrendSampler::new(SampleMode::Interval, INTERVAL);
        assert_eq!(sampler.on_tick(t0 + INTERVAL * 3), 0);

        assert_eq!(sampler.on_snapshot(t0), 1);
        assert_eq!(sampler.on_snapshot(t0 + Duration::from_millis(200)), 0);
        assert_eq!(sampler.on_tick(t0 + Duration::from_millis(999)), 0);
        assert_eq!(sampler.on_tick(t0 + INTERVAL), 1);
        assert_eq!(sampler.next_due(), Some(t0 + INTERVAL * 2));
    }

    #[test]
    fn late_poll_records_once_and_keeps_phase() {
        let t0 = Instant::now();
        let mut sampler = TrendSampler::new(SampleMode::Interval, INTERVAL);
        sampler.on_snapshot(t0);
        assert_eq!(sampler.on_tick(t0 + Duration::from_millis(4_500)), 1);
        assert_eq!(sampler.next_due(), Some(t0 + INTERVAL * 5));
        assert_eq!(sampler.on_tick(t0 + Duration::from_millis(4_900)), 0);
        assert_eq!(sampler.on_tick(t0 + INTERVAL * 5), 1);
    }

    #[test]
    fn cancel_stops_both_sources() {
        let t0 = Instant::now();
        let mut sampler = TrendSampler::new(SampleMode::Interval, INTERVAL);
        sampler.on_snapshot(t0);
        sampler.cancel();
        assert!(sampler.is_cancelled());
        assert_eq!(sampler.on_tick(t0 + INTERVAL * 5), 0);
        assert_eq!(sampler.on_snapshot(t0 + INTERVAL * 6), 0);

        let mut per_snapshot = TrendSampler::new(SampleMode::Snapshot, INTERVAL);
        per_snapshot.cancel();
        assert_eq!(per_snapshot.on_snapshot(t0), 0);
    }
}
