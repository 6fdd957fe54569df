//! Scene drawing for the ticker strip using vello.
//!
//! Layout comes from `view::TickerLayout`; this module only paints. Text is
//! shaped with skrifa glyph metrics when a system font is available and
//! otherwise drawn as placeholder blocks so the strip still reads at a glance.

use vello::kurbo::{Affine, BezPath, Circle, Line, Rect, RoundedRect, Stroke};
use vello::peniko::{Color, Fill, FontData};
use vello::{Glyph, Scene};

use crate::theme::ThemeTokens;
use crate::view::{TickerLayout, TickerView};

const ELLIPSIS: &str = "...";

/// Draw one frame of the ticker.
pub fn render_ticker(
    scene: &mut Scene,
    layout: &TickerLayout,
    view: &TickerView,
    theme: &ThemeTokens,
    boost_label: &str,
    font: Option<&FontData>,
) {
    let s = layout.scale;
    let ty = &theme.type_size;
    let tier_color = theme.tier_color(view.tier);
    let bar_color = theme.bar_color(view.tier);

    scene.fill(Fill::NonZero, Affine::IDENTITY, theme.background(), None, &layout.bounds);

    // Top row: label, headline, boost button
    let label_size = ty.label * s;
    draw_text_in(scene, font, &view.label, layout.label, label_size, tier_color, Align::Start);

    if let Some(headline) = &view.headline {
        let size = ty.headline * s;
        let fitted = truncate_to_width(font, headline, size, layout.headline.width());
        draw_text_in(scene, font, &fitted, layout.headline, size, theme.text(), Align::Start);
    }

    draw_button(scene, layout, theme, boost_label, font);

    // Gauge
    let radius = theme.spacing.corner_radius * s;
    let track = rounded(layout.gauge, radius);
    scene.fill(Fill::NonZero, Affine::IDENTITY, theme.gauge_track(), None, &track);
    let fill = layout.gauge_fill(view.gauge_percent);
    if fill.width() > 0.0 {
        scene.fill(Fill::NonZero, Affine::IDENTITY, bar_color, None, &rounded(fill, radius));
    }

    draw_trend(scene, layout, view, theme, font, bar_color);
}

fn draw_button(
    scene: &mut Scene,
    layout: &TickerLayout,
    theme: &ThemeTokens,
    label: &str,
    font: Option<&FontData>,
) {
    if layout.button.width() <= 0.0 || layout.button.height() <= 0.0 {
        return;
    }
    let s = layout.scale;
    let shape = rounded(layout.button, theme.spacing.corner_radius * s);
    scene.fill(Fill::NonZero, Affine::IDENTITY, theme.button(), None, &shape);
    let size = theme.type_size.button * s;
    let fitted = truncate_to_width(font, label, size, layout.button.width() - 2.0 * theme.spacing.gap * s);
    draw_text_in(scene, font, &fitted, layout.button, size, theme.button_text(), Align::Center);
}

fn draw_trend(
    scene: &mut Scene,
    layout: &TickerLayout,
    view: &TickerView,
    theme: &ThemeTokens,
    font: Option<&FontData>,
    line_color: Color,
) {
    let panel = layout.trend;
    if panel.height() <= 0.0 || panel.width() <= 0.0 {
        return;
    }
    let s = layout.scale;
    scene.fill(Fill::NonZero, Affine::IDENTITY, theme.trend_background(), None, &panel);

    let baseline = Line::new((panel.x0, panel.y1), (panel.x1, panel.y1));
    scene.stroke(&Stroke::new(s), Affine::IDENTITY, theme.trend_baseline(), None, &baseline);

    let points = layout.trend_to_pixels(&view.trend);
    match points.as_slice() {
        [] => {}
        [only] => {
            let dot = Circle::new(*only, theme.trend.stroke_width * s);
            scene.fill(Fill::NonZero, Affine::IDENTITY, line_color, None, &dot);
        }
        [first, rest @ ..] => {
            let mut path = BezPath::new();
            path.move_to(*first);
            for p in rest {
                path.line_to(*p);
            }
            let stroke = Stroke::new(theme.trend.stroke_width * s);
            scene.stroke(&stroke, Affine::IDENTITY, line_color, None, &path);
        }
    }

    let caption = theme.type_size.caption * s;
    let inset = theme.spacing.gap * s;
    let caption_color = theme.caption();
    let top = Rect::new(panel.x0 + inset, panel.y0, panel.x1, panel.y0 + caption * 1.4);
    let bottom = Rect::new(panel.x0 + inset, panel.y1 - caption * 1.4, panel.x1, panel.y1);
    draw_text_in(scene, font, "100%", top, caption, caption_color, Align::Start);
    draw_text_in(scene, font, "0%", bottom, caption, caption_color, Align::Start);
    draw_text_in(scene, font, "Energy Trend", top, caption, caption_color, Align::Center);
    if view.stale {
        let right = Rect::new(panel.x0, panel.y0, panel.x1 - inset, panel.y0 + caption * 1.4);
        draw_text_in(scene, font, "offline", right, caption, theme.stale(), Align::End);
    }
}

fn rounded(rect: Rect, radius: f64) -> RoundedRect {
    let r = radius.min(rect.height() / 2.0).min(rect.width() / 2.0).max(0.0);
    RoundedRect::from_rect(rect, r)
}

// --- Text ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Start,
    Center,
    End,
}

/// Draw `text` vertically centered inside `area`.
fn draw_text_in(
    scene: &mut Scene,
    font: Option<&FontData>,
    text: &str,
    area: Rect,
    size: f64,
    color: Color,
    align: Align,
) {
    if text.is_empty() || size <= 0.0 {
        return;
    }
    let width = measure_text(font, text, size);
    let x = match align {
        Align::Start => area.x0,
        Align::Center => area.x0 + (area.width() - width) / 2.0,
        Align::End => area.x1 - width,
    };
    let baseline = area.y0 + (area.height() + size * 0.7) / 2.0;

    match font.and_then(|f| layout_line(f, text, size as f32, x, baseline).map(|g| (f, g))) {
        Some((font, glyphs)) => {
            if !glyphs.is_empty() {
                scene
                    .draw_glyphs(font)
                    .font_size(size as f32)
                    .brush(&color)
                    .draw(Fill::NonZero, glyphs.into_iter());
            }
        }
        None => draw_placeholder_text(scene, text, x, baseline, size, color),
    }
}

/// Place glyphs for a single line starting at `(x, baseline)`.
fn layout_line(font: &FontData, text: &str, size: f32, x: f64, baseline: f64) -> Option<Vec<Glyph>> {
    use skrifa::MetadataProvider;

    let font_ref = skrifa::FontRef::from_index(font.data.as_ref(), font.index).ok()?;
    let charmap = font_ref.charmap();
    let metrics = font_ref.glyph_metrics(
        skrifa::instance::Size::new(size),
        skrifa::instance::LocationRef::default(),
    );

    let mut pen = x;
    let glyphs = text
        .chars()
        .map(|ch| {
            let gid = charmap.map(ch).unwrap_or_default();
            let glyph = Glyph {
                id: gid.to_u32(),
                x: pen as f32,
                y: baseline as f32,
            };
            pen += metrics.advance_width(gid).unwrap_or(size * 0.5) as f64;
            glyph
        })
        .collect();
    Some(glyphs)
}

/// Advance width of `text` at `size`.
pub fn measure_text(font: Option<&FontData>, text: &str, size: f64) -> f64 {
    use skrifa::MetadataProvider;

    let Some(font_ref) = font.and_then(|f| skrifa::FontRef::from_index(f.data.as_ref(), f.index).ok())
    else {
        return placeholder_advance(size) * text.chars().count() as f64;
    };
    let charmap = font_ref.charmap();
    let metrics = font_ref.glyph_metrics(
        skrifa::instance::Size::new(size as f32),
        skrifa::instance::LocationRef::default(),
    );
    text.chars()
        .map(|ch| {
            let gid = charmap.map(ch).unwrap_or_default();
            metrics.advance_width(gid).unwrap_or(size as f32 * 0.5) as f64
        })
        .sum()
}

/// Shorten `text` with a trailing "..." until it fits in `max_width`.
pub fn truncate_to_width(font: Option<&FontData>, text: &str, size: f64, max_width: f64) -> String {
    if measure_text(font, text, size) <= max_width {
        return text.to_string();
    }
    let budget = max_width - measure_text(font, ELLIPSIS, size);
    if budget <= 0.0 {
        return String::new();
    }
    let mut kept = String::new();
    let mut used = 0.0;
    for ch in text.chars() {
        let w = measure_text(font, ch.encode_utf8(&mut [0; 4]), size);
        if used + w > budget {
            break;
        }
        used += w;
        kept.push(ch);
    }
    let mut out = kept.trim_end().to_string();
    out.push_str(ELLIPSIS);
    out
}

fn placeholder_advance(size: f64) -> f64 {
    size * 0.6
}

/// No font on this machine: one block per visible character.
fn draw_placeholder_text(scene: &mut Scene, text: &str, x: f64, baseline: f64, size: f64, color: Color) {
    let advance = placeholder_advance(size);
    let height = size * 0.7;
    for (i, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        let x0 = x + i as f64 * advance;
        let block = Rect::new(x0, baseline - height, x0 + advance * 0.8, baseline);
        scene.fill(Fill::NonZero, Affine::IDENTITY, color, None, &block);
    }
}

// --- Font loading ---

fn load_system_font(font_names: &[&str]) -> Option<FontData> {
    let dirs = [
        "/System/Library/Fonts/",
        "/System/Library/Fonts/Supplemental/",
        "/Library/Fonts/",
        "/usr/share/fonts/truetype/dejavu/",
        "/usr/share/fonts/truetype/liberation/",
        "/usr/share/fonts/truetype/",
        "/usr/share/fonts/opentype/",
    ];
    let extensions = ["ttf", "otf", "ttc"];

    for name in font_names {
        for dir in &dirs {
            for ext in &extensions {
                let path = format!("{}{}.{}", dir, name, ext);
                if let Ok(data) = std::fs::read(&path) {
                    tracing::info!(target: "render", path = %path, "Loaded font");
                    return Some(FontData::new(data.into(), 0));
                }
            }
        }
    }
    None
}

/// Sans-serif font for all ticker text.
pub fn load_readable_font() -> Option<FontData> {
    load_system_font(&[
        "Helvetica",
        "Arial",
        "DejaVuSans",
        "LiberationSans-Regular",
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Tier;

    fn view(trend: Vec<(f64, f64)>, stale: bool) -> TickerView {
        TickerView {
            energy: 83.0,
            gauge_percent: 83.0,
            tier: Tier::Healthy,
            label: "Energy: 83%".into(),
            headline: Some("A very long headline that will not fit in the space".into()),
            trend,
            stale,
        }
    }

    #[test]
    fn placeholder_measure_is_per_char() {
        assert_eq!(measure_text(None, "", 10.0), 0.0);
        assert!((measure_text(None, "abcd", 10.0) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn truncation_adds_ellipsis() {
        assert_eq!(truncate_to_width(None, "short", 10.0, 100.0), "short");
        let cut = truncate_to_width(None, "abcdefghijklmnop", 10.0, 60.0);
        assert!(cut.ends_with(ELLIPSIS));
        assert!(measure_text(None, &cut, 10.0) <= 60.0);
        assert_eq!(truncate_to_width(None, "abcdef", 10.0, 5.0), "");
    }

    #[test]
    fn renders_without_font() {
        let theme = ThemeTokens::default();
        let layout = TickerLayout::compute(1280.0, 144.0, 1.0, &theme);
        for trend in [vec![], vec![(0.0, 0.5)], vec![(0.0, 0.2), (1.0, 0.8)]] {
            let mut scene = Scene::new();
            render_ticker(&mut scene, &layout, &view(trend, true), &theme, "Endure +5%", None);
        }
    }

    #[test]
    fn renders_on_tiny_surface() {
        let theme = ThemeTokens::default();
        let layout = TickerLayout::compute(4.0, 4.0, 1.0, &theme);
        let mut scene = Scene::new();
        render_ticker(&mut scene, &layout, &view(vec![(0.0, 1.0)], false), &theme, "Boost", None);
    }
}
