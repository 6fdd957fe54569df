//! `ticker.toml` configuration.
//!
//! Every field has a compiled default, so a missing file or a partial file
//! is fine. Only the `[theme]` section is hot-reloaded (see
//! `config_watcher`); the rest applies at startup.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::theme::ThemeTokens;
use crate::ticker::{AdoptionPolicy, SampleMode, WidgetSettings};

pub const DEFAULT_FEED_URL: &str = "ws://localhost:9300";
pub const INITIAL_ENERGY_ENV: &str = "TICKER_INITIAL_ENERGY";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerConfig {
    pub feed: FeedConfig,
    pub store: StoreConfig,
    pub rotation: RotationConfig,
    pub trend: TrendConfig,
    pub window: WindowConfig,
    pub theme: ThemeTokens,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    pub reconnect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub initial_energy: f64,
    pub adoption: AdoptionPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub period_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub capacity: usize,
    pub sampling: SampleMode,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f64,
    pub height: f64,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub always_on_top: bool,
    pub decorations: bool,
    pub boost_label: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            reconnect_secs: 3,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_energy: crate::ticker::store::DEFAULT_INITIAL_ENERGY,
            adoption: AdoptionPolicy::default(),
        }
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self { period_ms: 10_000 }
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            capacity: crate::ticker::history::DEFAULT_HISTORY_CAPACITY,
            sampling: SampleMode::default(),
            interval_ms: 1_000,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 144.0,
            x: None,
            y: None,
            always_on_top: true,
            decorations: false,
            boost_label: "Endure +5%".to_string(),
        }
    }
}

impl TickerConfig {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(target: "config", path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        info!(target: "config", path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(INITIAL_ENERGY_ENV) {
            match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => self.store.initial_energy = v,
                _ => warn!(target: "config", value = %raw, "Ignoring invalid {}", INITIAL_ENERGY_ENV),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.feed.url)
            .with_context(|| format!("Invalid feed url {:?}", self.feed.url))?;
        if url.scheme() != "ws" {
            bail!("Feed url must use the ws:// scheme, got {}", url.scheme());
        }
        if self.rotation.period_ms == 0 {
            bail!("rotation.period_ms must be greater than zero");
        }
        if self.trend.capacity == 0 {
            bail!("trend.capacity must be at least 1");
        }
        if self.trend.interval_ms == 0 {
            bail!("trend.interval_ms must be greater than zero");
        }
        if !self.store.initial_energy.is_finite() {
            bail!("store.initial_energy must be a finite number");
        }
        if !(self.window.width > 0.0 && self.window.height > 0.0) {
            bail!("window.width and window.height must be positive");
        }
        for slot in self.theme.invalid_colors() {
            warn!(target: "config", slot, "Unparsable theme color, using default");
        }
        Ok(())
    }

    pub fn widget_settings(&self) -> WidgetSettings {
        WidgetSettings {
            initial_energy: self.store.initial_energy,
            adoption: self.store.adoption,
            rotation_period: Duration::from_millis(self.rotation.period_ms),
            history_capacity: self.trend.capacity,
            sampling: self.trend.sampling,
            sample_interval: Duration::from_millis(self.trend.interval_ms),
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.feed.reconnect_secs)
    }
}
