//! Mount/unmount glue tying the feed subscription to the store and timers.
//!
//! A `TickerWidget` holds exactly one subscription from mount until
//! unmount. Unmount releases the subscription, stops the rotator and
//! cancels the sampler in one step; afterwards every entry point is a
//! no-op.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::sampler::{SampleMode, TrendSampler};
use super::store::{AdoptionPolicy, TickerStore};
use crate::feed::{PushChannel, Subscription};
use crate::protocol::SnapshotUpdate;
use crate::state_machine::rotator_sm::NewsRotator;

/// Upper bound on the gap between pumps, so deliveries never pile up in
/// the subscription while no frame is drawn.
pub const FEED_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Everything a widget needs at mount time.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSettings {
    pub initial_energy: f64,
    pub adoption: AdoptionPolicy,
    pub rotation_period: Duration,
    pub history_capacity: usize,
    pub sampling: SampleMode,
    pub sample_interval: Duration,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            initial_energy: super::store::DEFAULT_INITIAL_ENERGY,
            adoption: AdoptionPolicy::default(),
            rotation_period: crate::state_machine::rotator_sm::DEFAULT_ROTATION_PERIOD,
            history_capacity: super::history::DEFAULT_HISTORY_CAPACITY,
            sampling: SampleMode::default(),
            sample_interval: super::sampler::DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

/// Result of one `pump`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    pub updates: usize,
    pub adoptions: usize,
    pub samples: usize,
}

pub struct TickerWidget {
    store: TickerStore,
    rotator: NewsRotator,
    sampler: TrendSampler,
    subscription: Option<Subscription>,
}

impl TickerWidget {
    /// Create the store and take the widget's single subscription.
    pub fn mount<C>(channel: &C, settings: &WidgetSettings) -> Self
    where
        C: PushChannel + ?Sized,
    {
        let widget = Self {
            store: TickerStore::new(
                settings.initial_energy,
                settings.adoption,
                settings.history_capacity,
            ),
            rotator: NewsRotator::new(settings.rotation_period),
            sampler: TrendSampler::new(settings.sampling, settings.sample_interval),
            subscription: Some(channel.subscribe()),
        };
        info!(
            target: "widget",
            adoption = ?widget.store.policy(),
            sampling = ?widget.sampler.mode(),
            capacity = widget.store.history().capacity(),
            "Ticker widget mounted"
        );
        widget
    }

    /// Latest instant the next `pump` should run, whether or not a frame
    /// gets drawn. `None` once unmounted.
    pub fn next_wake(&self, now: Instant) -> Option<Instant> {
        if !self.is_mounted() {
            return None;
        }
        let poll = now + FEED_POLL_INTERVAL;
        Some(self.sampler.next_due().map_or(poll, |due| due.max(now).min(poll)))
    }

    /// Drain pending deliveries in order, then poll both timers at `now`.
    pub fn pump(&mut self, now: Instant) -> PumpReport {
        let mut report = PumpReport::default();
        loop {
            let Some(update) = self.subscription.as_mut().and_then(Subscription::try_next) else {
                break;
            };
            report.updates += 1;
            let (adopted, samples) = self.ingest(update, now);
            report.adoptions += usize::from(adopted);
            report.samples += samples;
        }
        report.samples += self.tick(now);
        report
    }

    fn ingest(&mut self, update: SnapshotUpdate, now: Instant) -> (bool, usize) {
        let applied = self.store.apply(update);
        if applied.news_adopted {
            let len = self.store.news().len();
            debug!(target: "widget", len, "News list adopted");
            self.rotator.adopt(len, now);
        }
        let samples = if applied.energy {
            let due = self.sampler.on_snapshot(now);
            self.record(due)
        } else {
            0
        };
        (applied.news_adopted, samples)
    }

    /// Poll the rotation and sampling cadences. Returns samples taken.
    pub fn tick(&mut self, now: Instant) -> usize {
        if !self.is_mounted() {
            return 0;
        }
        self.rotator.tick(now);
        let due = self.sampler.on_tick(now);
        self.record(due)
    }

    fn record(&mut self, due: u32) -> usize {
        if due == 0 {
            return 0;
        }
        self.store.record_sample();
        1
    }

    /// Release the subscription and both timers together.
    ///
    /// Returns `true` only for the call that actually tore down.
    pub fn unmount(&mut self) -> bool {
        let Some(subscription) = self.subscription.take() else {
            return false;
        };
        subscription.dispose();
        self.rotator.teardown();
        self.sampler.cancel();
        info!(target: "widget", "Ticker widget unmounted");
        true
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn store(&self) -> &TickerStore {
        &self.store
    }

    pub fn display_index(&self) -> Option<usize> {
        self.rotator.display_index()
    }

    /// Headline currently on display.
    pub fn headline(&self) -> Option<&str> {
        let index = self.rotator.display_index()?;
        self.store.news().get(index).map(String::as_str)
    }
}

impl Drop for TickerWidget {
    fn drop(&mut self) {
        self.unmount();
    }
}
