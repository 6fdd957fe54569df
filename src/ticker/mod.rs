//! Widget core: store, history, timers, and the mount lifecycle.

pub mod history;
pub mod sampler;
pub mod store;
pub mod timer;
pub mod widget;

pub use history::HistoryBuffer;
pub use sampler::{SampleMode, TrendSampler};
pub use store::{AdoptionPolicy, Applied, TickerStore};
pub use timer::PeriodicTimer;
pub use widget::{FEED_POLL_INTERVAL, PumpReport, TickerWidget, WidgetSettings};
