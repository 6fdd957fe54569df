//! Pure view model and layout for the ticker strip.
//!
//! `compose` turns widget state into display-ready values (clamped gauge,
//! tier, headline, normalized trend points). `TickerLayout` places the
//! parts for a surface size and answers the boost button hit-test. Neither
//! touches the scene; see `render` for drawing.

use vello::kurbo::{Point, Rect};

use crate::theme::ThemeTokens;
use crate::ticker::TickerWidget;

/// Display-only severity bucket derived from the clamped energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Healthy,
    Moderate,
    Low,
    Critical,
    Depleted,
}

impl Tier {
    pub fn for_energy(energy: f64) -> Self {
        let e = clamp_energy(energy);
        if e > 70.0 {
            Tier::Healthy
        } else if e > 50.0 {
            Tier::Moderate
        } else if e > 20.0 {
            Tier::Low
        } else if e > 0.0 {
            Tier::Critical
        } else {
            Tier::Depleted
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Healthy => "healthy",
            Tier::Moderate => "moderate",
            Tier::Low => "low",
            Tier::Critical => "critical",
            Tier::Depleted => "depleted",
        }
    }
}

/// Clamp into `[0, 100]` for display. NaN renders as empty.
pub fn clamp_energy(energy: f64) -> f64 {
    if energy.is_nan() {
        0.0
    } else {
        energy.clamp(0.0, 100.0)
    }
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerView {
    /// Stored value, unclamped.
    pub energy: f64,
    pub gauge_percent: f64,
    pub tier: Tier,
    pub label: String,
    pub headline: Option<String>,
    /// `(x, y)` in `[0, 1]`, oldest first; `y = 1` is 100%.
    pub trend: Vec<(f64, f64)>,
    pub stale: bool,
}

pub fn compose(widget: &TickerWidget, connected: bool) -> TickerView {
    let store = widget.store();
    let energy = store.energy();
    let gauge_percent = clamp_energy(energy);
    TickerView {
        energy,
        gauge_percent,
        tier: Tier::for_energy(energy),
        label: format!("Energy: {}%", gauge_percent.round() as i64),
        headline: widget.headline().map(str::to_string),
        trend: trend_points(store.history().iter()),
        stale: !connected,
    }
}

/// Normalize samples to `(i / max(n - 1, 1), clamp(v) / 100)`.
pub fn trend_points(samples: impl ExactSizeIterator<Item = f64>) -> Vec<(f64, f64)> {
    let span = samples.len().saturating_sub(1).max(1) as f64;
    samples
        .enumerate()
        .map(|(i, v)| (i as f64 / span, clamp_energy(v) / 100.0))
        .collect()
}

/// Pixel rectangles for each part of the strip.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerLayout {
    pub scale: f64,
    pub bounds: Rect,
    pub label: Rect,
    pub headline: Rect,
    pub button: Rect,
    pub gauge: Rect,
    pub trend: Rect,
}

impl TickerLayout {
    /// Lay out a `width` × `height` physical-pixel surface. Theme sizes are
    /// logical pixels and get multiplied by `scale`.
    pub fn compute(width: f64, height: f64, scale: f64, theme: &ThemeTokens) -> Self {
        let s = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let sp = &theme.spacing;
        let pad = sp.padding * s;
        let gap = sp.gap * s;
        let right = (width - pad).max(pad);
        let bottom = (height - pad).max(pad);

        let row_top = pad;
        let row_bottom = (row_top + sp.row_height * s).min(bottom);

        let label = Rect::new(pad, row_top, (pad + sp.label_width * s).min(right), row_bottom);
        let button = Rect::new(
            (right - sp.button_width * s).max(label.x1),
            row_top,
            right,
            row_bottom,
        );
        let headline = Rect::new(
            (label.x1 + gap * 4.0).min(button.x0),
            row_top,
            (button.x0 - gap * 4.0).max(label.x1),
            row_bottom,
        );

        let gauge_top = (row_bottom + gap).min(bottom);
        let gauge = Rect::new(pad, gauge_top, right, (gauge_top + theme.gauge.height * s).min(bottom));

        let trend_top = (gauge.y1 + gap).min(bottom);
        let trend = Rect::new(pad, trend_top, right, bottom);

        Self {
            scale: s,
            bounds: Rect::new(0.0, 0.0, width.max(0.0), height.max(0.0)),
            label,
            headline,
            button,
            gauge,
            trend,
        }
    }

    pub fn boost_hit(&self, point: Point) -> bool {
        self.button.width() > 0.0 && self.button.height() > 0.0 && self.button.contains(point)
    }

    /// Gauge fill rectangle for a clamped percentage.
    pub fn gauge_fill(&self, percent: f64) -> Rect {
        let fraction = clamp_energy(percent) / 100.0;
        Rect::new(
            self.gauge.x0,
            self.gauge.y0,
            self.gauge.x0 + self.gauge.width() * fraction,
            self.gauge.y1,
        )
    }

    /// Map normalized trend points into the trend rectangle.
    pub fn trend_to_pixels(&self, points: &[(f64, f64)]) -> Vec<Point> {
        points
            .iter()
            .map(|(x, y)| {
                Point::new(
                    self.trend.x0 + x * self.trend.width(),
                    self.trend.y1 - y * self.trend.height(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::SnapshotFeed;
    use crate::protocol::Snapshot;
    use crate::ticker::WidgetSettings;
    use std::time::Instant;

    #[test]
    fn tier_thresholds() {
        assert_eq!(Tier::for_energy(100.0), Tier::Healthy);
        assert_eq!(Tier::for_energy(70.5), Tier::Healthy);
        assert_eq!(Tier::for_energy(70.0), Tier::Moderate);
        assert_eq!(Tier::for_energy(50.0), Tier::Low);
        assert_eq!(Tier::for_energy(20.0), Tier::Critical);
        assert_eq!(Tier::for_energy(0.1), Tier::Critical);
        assert_eq!(Tier::for_energy(0.0), Tier::Depleted);
    }

    #[test]
    fn tier_saturates_outside_range() {
        for e in [-0.0, -5.0, -1e9, f64::NEG_INFINITY, f64::NAN] {
            assert_eq!(Tier::for_energy(e), Tier::Depleted, "{e}");
        }
        for e in [100.1, 250.0, 1e9, f64::INFINITY] {
            assert_eq!(Tier::for_energy(e), Tier::Healthy, "{e}");
        }
    }

    #[test]
    fn tier_is_monotonic() {
        let order = |t: Tier| match t {
            Tier::Depleted => 0,
            Tier::Critical => 1,
            Tier::Low => 2,
            Tier::Moderate => 3,
            Tier::Healthy => 4,
        };
        let mut last = 0;
        for i in -200..=400 {
            let rank = order(Tier::for_energy(i as f64 * 0.5));
            assert!(rank >= last);
            last = rank;
        }
    }

    #[test]
    fn clamp_saturates() {
        assert_eq!(clamp_energy(-5.0), 0.0);
        assert_eq!(clamp_energy(140.0), 100.0);
        assert_eq!(clamp_energy(42.5), 42.5);
        assert_eq!(clamp_energy(f64::NAN), 0.0);
    }

    #[test]
    fn trend_points_normalize() {
        assert!(trend_points(std::iter::empty()).is_empty());
        assert_eq!(trend_points([50.0].into_iter()), vec![(0.0, 0.5)]);
        assert_eq!(
            trend_points([0.0, -10.0, 150.0].into_iter()),
            vec![(0.0, 0.0), (0.5, 0.0), (1.0, 1.0)]
        );
    }

    #[test]
    fn compose_reads_widget_state() {
        let feed = SnapshotFeed::new();
        let mut widget = TickerWidget::mount(&feed, &WidgetSettings::default());
        let before = compose(&widget, false);
        assert_eq!(before.label, "Energy: 100%");
        assert_eq!(before.headline, None);
        assert!(before.trend.is_empty());
        assert!(before.stale);

        feed.publish(Snapshot::new(-5.0, ["A"]).into());
        widget.pump(Instant::now());
        let view = compose(&widget, true);
        assert_eq!(view.energy, -5.0);
        assert_eq!(view.gauge_percent, 0.0);
        assert_eq!(view.label, "Energy: 0%");
        assert_eq!(view.tier, Tier::Depleted);
        assert_eq!(view.headline.as_deref(), Some("A"));
        assert!(!view.stale);
    }

    #[test]
    fn layout_places_button_on_the_right() {
        let theme = ThemeTokens::default();
        let layout = TickerLayout::compute(1280.0, 144.0, 1.0, &theme);
        assert!((layout.button.x1 - 1272.0).abs() < 1e-9);
        assert!((layout.button.width() - 120.0).abs() < 1e-9);
        assert!(layout.headline.x0 >= layout.label.x1);
        assert!(layout.headline.x1 <= layout.button.x0);
        assert!(layout.gauge.y0 >= layout.label.y1);
        assert!(layout.trend.y0 >= layout.gauge.y1);
        assert!(layout.trend.y1 <= 144.0);

        assert!(layout.boost_hit(layout.button.center()));
        assert!(!layout.boost_hit(layout.label.center()));
        assert!(!layout.boost_hit(Point::new(-1.0, -1.0)));
    }

    #[test]
    fn layout_scales_with_dpi() {
        let theme = ThemeTokens::default();
        let layout = TickerLayout::compute(2560.0, 288.0, 2.0, &theme);
        assert!((layout.button.width() - 240.0).abs() < 1e-9);
        assert!((layout.gauge.height() - 32.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_surface_does_not_invert_rects() {
        let theme = ThemeTokens::default();
        let layout = TickerLayout::compute(10.0, 10.0, 1.0, &theme);
        for rect in [layout.label, layout.headline, layout.button, layout.gauge, layout.trend] {
            assert!(rect.x1 >= rect.x0 && rect.y1 >= rect.y0, "{rect:?}");
        }
    }

    #[test]
    fn gauge_fill_clamps() {
        let theme = ThemeTokens::default();
        let layout = TickerLayout::compute(1000.0, 144.0, 1.0, &theme);
        assert_eq!(layout.gauge_fill(-5.0).width(), 0.0);
        assert!((layout.gauge_fill(250.0).width() - layout.gauge.width()).abs() < 1e-9);
        assert!((layout.gauge_fill(50.0).width() - layout.gauge.width() / 2.0).abs() < 1e-9);
    }

    #[test]
    fn trend_maps_into_panel() {
        let theme = ThemeTokens::default();
        let layout = TickerLayout::compute(1000.0, 144.0, 1.0, &theme);
        let pts = layout.trend_to_pixels(&[(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(pts[0], Point::new(layout.trend.x0, layout.trend.y1));
        assert_eq!(pts[1], Point::new(layout.trend.x1, layout.trend.y0));
    }
}
