//! Sole owner of the widget's data: energy, adopted news list, history.

use serde::{Deserialize, Serialize};

use super::history::HistoryBuffer;
use crate::protocol::{Snapshot, SnapshotUpdate};

/// Energy shown before the first snapshot arrives.
pub const DEFAULT_INITIAL_ENERGY: f64 = 100.0;

/// Rule deciding when an incoming news list replaces the adopted one.
///
/// Neither policy lets an empty list replace an adopted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AdoptionPolicy {
    /// Adopt the first non-empty list and keep it for the widget's lifetime.
    First,
    /// Adopt every non-empty list whose contents differ from the adopted one.
    #[default]
    Latest,
}

/// What a single `apply` changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Applied {
    pub energy: bool,
    pub news_adopted: bool,
}

#[derive(Debug, Clone)]
pub struct TickerStore {
    energy: f64,
    news: Vec<String>,
    history: HistoryBuffer,
    policy: AdoptionPolicy,
    received: bool,
}

impl TickerStore {
    pub fn new(initial_energy: f64, policy: AdoptionPolicy, history_capacity: usize) -> Self {
        Self {
            energy: initial_energy,
            news: Vec::new(),
            history: HistoryBuffer::new(history_capacity),
            policy,
            received: false,
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> Applied {
        self.apply(snapshot.into())
    }

    /// Apply a validated update. Energy is last-write-wins and never clamped.
    pub fn apply(&mut self, update: SnapshotUpdate) -> Applied {
        let mut applied = Applied::default();

        if let Some(energy) = update.energy {
            self.energy = energy;
            self.received = true;
            applied.energy = true;
        }

        if let Some(news) = update.news {
            if self.should_adopt(&news) {
                self.news = news;
                applied.news_adopted = true;
            }
        }

        applied
    }

    fn should_adopt(&self, incoming: &[String]) -> bool {
        if incoming.is_empty() {
            return false;
        }
        match self.policy {
            AdoptionPolicy::First => self.news.is_empty(),
            AdoptionPolicy::Latest => self.news.as_slice() != incoming,
        }
    }

    /// Append the current energy to the history.
    pub fn record_sample(&mut self) {
        self.history.push(self.energy);
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn news(&self) -> &[String] {
        &self.news
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn policy(&self) -> AdoptionPolicy {
        self.policy
    }

    /// True once any snapshot has carried a valid energy value.
    pub fn has_received(&self) -> bool {
        self.received
    }
}

impl Default for TickerStore {
    fn default() -> Self {
        Self::new(
            DEFAULT_INITIAL_ENERGY,
            AdoptionPolicy::default(),
            super::history::DEFAULT_HISTORY_CAPACITY,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(policy: AdoptionPolicy) -> TickerStore {
        TickerStore::new(DEFAULT_INITIAL_ENERGY, policy, 8)
    }

    #[test]
    fn starts_with_fallback_energy_and_no_news() {
        let s = TickerStore::default();
        assert_eq!(s.energy(), 100.0);
        assert!(s.news().is_empty());
        assert!(s.history().is_empty());
        assert!(!s.has_received());
    }

    #[test]
    fn energy_is_stored_exactly_without_clamping() {
        let mut s = store(AdoptionPolicy::Latest);
        for energy in [83.0, -5.0, 250.0, 0.0, 99.999] {
            let applied = s.apply_snapshot(Snapshot::new(energy, ["A"]));
            assert!(applied.energy);
            assert_eq!(s.energy(), energy);
        }
        assert!(s.has_received());
    }

    #[test]
    fn missing_energy_keeps_prior_value() {
        let mut s = store(AdoptionPolicy::Latest);
        s.apply_snapshot(Snapshot::new(42.0, Vec::<String>::new()));
        let applied = s.apply(SnapshotUpdate {
            energy: None,
            news: Some(vec!["x".into()]),
        });
        assert!(!applied.energy);
        assert!(applied.news_adopted);
        assert_eq!(s.energy(), 42.0);
    }

    #[test]
    fn first_policy_ignores_later_lists() {
        let mut s = store(AdoptionPolicy::First);
        assert!(s.apply_snapshot(Snapshot::new(50.0, ["A", "B"])).news_adopted);
        let applied = s.apply_snapshot(Snapshot::new(50.0, ["C"]));
        assert!(!applied.news_adopted);
        assert_eq!(s.news(), ["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn latest_policy_adopts_changed_lists_only() {
        let mut s = store(AdoptionPolicy::Latest);
        assert!(s.apply_snapshot(Snapshot::new(50.0, ["A", "B"])).news_adopted);
        assert!(!s.apply_snapshot(Snapshot::new(50.0, ["A", "B"])).news_adopted);
        assert!(s.apply_snapshot(Snapshot::new(50.0, ["C"])).news_adopted);
        assert_eq!(s.news(), ["C".to_string()]);
    }

    #[test]
    fn empty_list_never_replaces_adopted_list() {
        for policy in [AdoptionPolicy::First, AdoptionPolicy::Latest] {
            let mut s = store(policy);
            s.apply_snapshot(Snapshot::new(50.0, ["A"]));
            let applied = s.apply_snapshot(Snapshot::new(-5.0, Vec::<String>::new()));
            assert!(!applied.news_adopted, "{policy:?}");
            assert_eq!(s.news(), ["A".to_string()]);
            assert_eq!(s.energy(), -5.0);
        }
    }

    #[test]
    fn record_sample_appends_current_energy() {
        let mut s = store(AdoptionPolicy::Latest);
        s.record_sample();
        s.apply_snapshot(Snapshot::new(70.0, Vec::<String>::new()));
        s.record_sample();
        assert_eq!(s.history().to_vec(), vec![100.0, 70.0]);
    }

    #[test]
    fn policy_parses_from_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            adoption: AdoptionPolicy,
        }
        let w: Wrapper = toml::from_str("adoption = \"first\"").unwrap();
        assert_eq!(w.adoption, AdoptionPolicy::First);
    }
}
