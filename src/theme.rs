//! Theme tokens for the ticker's visual system.
//!
//! Every visual constant (palette, sizes, spacing) lives in `ThemeTokens`,
//! which is the `[theme]` section of `ticker.toml` and can be hot-reloaded.
//! Colors are `#rrggbb` or `#rrggbbaa` strings; an unparsable color falls
//! back to the compiled default for that slot.

use vello::peniko::Color;

use crate::view::Tier;

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ThemeTokens {
    pub palette: PaletteTokens,
    pub tiers: TierTokens,
    pub type_size: TypeTokens,
    pub spacing: SpacingTokens,
    pub gauge: GaugeTokens,
    pub trend: TrendTokens,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct PaletteTokens {
    pub background: String,
    pub text: String,
    pub caption: String,
    pub button: String,
    pub button_text: String,
    pub stale: String,
}

/// One color per severity tier, used for label, gauge fill, and trend line.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct TierTokens {
    pub healthy: String,
    pub moderate: String,
    pub low: String,
    pub critical: String,
    pub depleted: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct TypeTokens {
    pub label: f64,
    pub headline: f64,
    pub button: f64,
    pub caption: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct SpacingTokens {
    pub padding: f64,
    pub gap: f64,
    pub row_height: f64,
    pub label_width: f64,
    pub button_width: f64,
    pub corner_radius: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct GaugeTokens {
    pub height: f64,
    pub track: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct TrendTokens {
    pub background: String,
    pub baseline: String,
    pub stroke_width: f64,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for ThemeTokens {
    fn default() -> Self {
        Self {
            palette: PaletteTokens::default(),
            tiers: TierTokens::default(),
            type_size: TypeTokens::default(),
            spacing: SpacingTokens::default(),
            gauge: GaugeTokens::default(),
            trend: TrendTokens::default(),
        }
    }
}

impl Default for PaletteTokens {
    fn default() -> Self {
        Self {
            background: "#f3f4f6".into(),
            text: "#000000".into(),
            caption: "#666666".into(),
            button: "#ec4899".into(),
            button_text: "#ffffff".into(),
            stale: "#9ca3af".into(),
        }
    }
}

impl Default for TierTokens {
    fn default() -> Self {
        Self {
            healthy: "#22c55e".into(),
            moderate: "#f97316".into(),
            low: "#eab308".into(),
            critical: "#ef4444".into(),
            depleted: "#b91c1c".into(),
        }
    }
}

impl Default for TypeTokens {
    fn default() -> Self {
        Self {
            label: 16.0,
            headline: 14.0,
            button: 14.0,
            caption: 8.0,
        }
    }
}

impl Default for SpacingTokens {
    fn default() -> Self {
        Self {
            padding: 8.0,
            gap: 4.0,
            row_height: 32.0,
            label_width: 160.0,
            button_width: 120.0,
            corner_radius: 4.0,
        }
    }
}

impl Default for GaugeTokens {
    fn default() -> Self {
        Self {
            height: 16.0,
            track: "#d1d5db".into(),
        }
    }
}

impl Default for TrendTokens {
    fn default() -> Self {
        Self {
            background: "#ffffff".into(),
            baseline: "#cccccc".into(),
            stroke_width: 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Color helpers
// ---------------------------------------------------------------------------

/// Parse `#rrggbb` / `#rrggbbaa` into straight RGBA components.
pub fn parse_hex(s: &str) -> Option<[f32; 4]> {
    let hex = s.trim().strip_prefix('#')?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Some([
        channel(0)? as f32 / 255.0,
        channel(2)? as f32 / 255.0,
        channel(4)? as f32 / 255.0,
        alpha as f32 / 255.0,
    ])
}

fn color_or(value: &str, fallback: &str) -> Color {
    let rgba = parse_hex(value)
        .or_else(|| parse_hex(fallback))
        .unwrap_or([0.0, 0.0, 0.0, 1.0]);
    Color::new(rgba)
}

impl ThemeTokens {
    pub fn background(&self) -> Color {
        color_or(&self.palette.background, &PaletteTokens::default().background)
    }

    pub fn text(&self) -> Color {
        color_or(&self.palette.text, &PaletteTokens::default().text)
    }

    pub fn caption(&self) -> Color {
        color_or(&self.palette.caption, &PaletteTokens::default().caption)
    }

    pub fn button(&self) -> Color {
        color_or(&self.palette.button, &PaletteTokens::default().button)
    }

    pub fn button_text(&self) -> Color {
        color_or(&self.palette.button_text, &PaletteTokens::default().button_text)
    }

    pub fn stale(&self) -> Color {
        color_or(&self.palette.stale, &PaletteTokens::default().stale)
    }

    pub fn gauge_track(&self) -> Color {
        color_or(&self.gauge.track, &GaugeTokens::default().track)
    }

    pub fn trend_background(&self) -> Color {
        color_or(&self.trend.background, &TrendTokens::default().background)
    }

    pub fn trend_baseline(&self) -> Color {
        color_or(&self.trend.baseline, &TrendTokens::default().baseline)
    }

    pub fn tier_color(&self, tier: Tier) -> Color {
        let defaults = TierTokens::default();
        let (value, fallback) = match tier {
            Tier::Healthy => (&self.tiers.healthy, defaults.healthy),
            Tier::Moderate => (&self.tiers.moderate, defaults.moderate),
            Tier::Low => (&self.tiers.low, defaults.low),
            Tier::Critical => (&self.tiers.critical, defaults.critical),
            Tier::Depleted => (&self.tiers.depleted, defaults.depleted),
        };
        color_or(value, &fallback)
    }

    /// Gauge fill and trend line color. Both stay critical red down to
    /// empty; the depleted shade is reserved for the label.
    pub fn bar_color(&self, tier: Tier) -> Color {
        match tier {
            Tier::Depleted => self.tier_color(Tier::Critical),
            other => self.tier_color(other),
        }
    }

    /// Names of color slots whose value does not parse.
    pub fn invalid_colors(&self) -> Vec<&'static str> {
        let slots: [(&'static str, &str); 14] = [
            ("palette.background", &self.palette.background),
            ("palette.text", &self.palette.text),
            ("palette.caption", &self.palette.caption),
            ("palette.button", &self.palette.button),
            ("palette.button_text", &self.palette.button_text),
            ("palette.stale", &self.palette.stale),
            ("tiers.healthy", &self.tiers.healthy),
            ("tiers.moderate", &self.tiers.moderate),
            ("tiers.low", &self.tiers.low),
            ("tiers.critical", &self.tiers.critical),
            ("tiers.depleted", &self.tiers.depleted),
            ("gauge.track", &self.gauge.track),
            ("trend.background", &self.trend.background),
            ("trend.baseline", &self.trend.baseline),
        ];
        slots
            .into_iter()
            .filter(|(_, value)| parse_hex(value).is_none())
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_and_eight_digit_hex() {
        assert_eq!(parse_hex("#ffffff"), Some([1.0, 1.0, 1.0, 1.0]));
        assert_eq!(parse_hex("#00000000"), Some([0.0, 0.0, 0.0, 0.0]));
        let green = parse_hex("#22c55e").unwrap();
        assert!((green[0] - 0x22 as f32 / 255.0).abs() < f32::EPSILON);
        assert!((green[1] - 0xc5 as f32 / 255.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["", "ffffff", "#fff", "#gggggg", "#12345", "#ééé", "#+f+f+f", "#+f+f+f+f"] {
            assert_eq!(parse_hex(bad), None, "{bad}");
        }
    }

    #[test]
    fn bars_stay_critical_red_when_depleted() {
        let theme = ThemeTokens::default();
        let rgba = |c: Color| c.components;
        assert_eq!(rgba(theme.bar_color(Tier::Depleted)), rgba(theme.tier_color(Tier::Critical)));
        assert_eq!(rgba(theme.bar_color(Tier::Healthy)), rgba(theme.tier_color(Tier::Healthy)));
        assert_ne!(rgba(theme.tier_color(Tier::Depleted)), rgba(theme.tier_color(Tier::Critical)));
    }

    #[test]
    fn defaults_are_all_valid_colors() {
        assert!(ThemeTokens::default().invalid_colors().is_empty());
    }

    #[test]
    fn invalid_slot_is_reported() {
        let mut theme = ThemeTokens::default();
        theme.tiers.low = "yellow".into();
        assert_eq!(theme.invalid_colors(), vec!["tiers.low"]);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let theme: ThemeTokens = toml::from_str(
            r##"
[tiers]
healthy = "#00ff00"
"##,
        )
        .unwrap();
        assert_eq!(theme.tiers.healthy, "#00ff00");
        assert_eq!(theme.tiers.depleted, "#b91c1c");
        assert!((theme.gauge.height - 16.0).abs() < f64::EPSILON);
    }

    #[test]
    fn toml_roundtrip() {
        let original = ThemeTokens::default();
        let text = toml::to_string_pretty(&original).unwrap();
        let parsed: ThemeTokens = toml::from_str(&text).unwrap();
        assert_eq!(parsed, original);
    }
}
