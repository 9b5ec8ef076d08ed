//! Turns the gauge state into a `Scene`: dial, needle, readout and control card.

use std::path::Path;

use rusttype::Font;
use tracing::{info, warn};

use crate::config::{palette, Color, GaugeConfig};
use crate::controller::ScanMode;
use crate::error::GaugeError;
use crate::geometry::{
    band_label_anchor, fill_gradient_radii, needle_polygon, ticks, Viewport, BANDS,
    BAND_STROKE_WIDTH, CENTER, DESIGN_BOUNDS, FILL_STOPS, HUB_INNER_RADIUS, HUB_OUTER_RADIUS,
    MAIN_ARC_INNER_RADIUS, MAIN_ARC_RADIUS, NEEDLE_SHADOW_OFFSET, NEEDLE_SHADOW_OPACITY,
    OUTER_RADIUS, TICK_OPACITY, TICK_STROKE_WIDTH,
};
use crate::panel::Layout;
use crate::scene::{text_width, Canvas, DrawCommand, Rect, Scene, TextAnchor};
use crate::score::Score;

/// Horizontal centre of the reference layout.
const DESIGN_MID_X: f64 = 280.0;

/// Everything that varies between two frames.
#[derive(Debug, Clone, Copy)]
pub struct FrameState<'a> {
    pub score: Score,
    pub scan: ScanMode,
    /// Eased needle angle in degrees, which may overshoot the score's angle.
    pub needle_angle: f64,
    /// Opacity of the readout indicator dot.
    pub pulse: f64,
    pub dragging: bool,
    pub subtitle: &'a str,
}

pub fn load_font(path: Option<&Path>) -> Result<Option<Font<'static>>, GaugeError> {
    let Some(path) = path else {
        warn!("no font configured; labels and readout text are not drawn");
        return Ok(None);
    };
    let bytes = std::fs::read(path).map_err(|source| GaugeError::FontRead {
        path: path.to_path_buf(),
        source,
    })?;
    let font = Font::try_from_vec(bytes).ok_or_else(|| GaugeError::InvalidFont(path.to_path_buf()))?;
    info!(path = %path.display(), glyphs = font.glyph_count(), "font loaded");
    Ok(Some(font))
}

pub fn render_frame(
    canvas: &mut Canvas,
    state: &FrameState,
    config: &GaugeConfig,
    font: Option<&Font<'static>>,
) {
    let layout = Layout::new(canvas.width(), canvas.height());
    let scene = compose(&layout, state, config, font);
    scene.render(canvas, font);
}

/// Builds the full draw list. `font` is only used to measure text.
pub fn compose(
    layout: &Layout,
    state: &FrameState,
    config: &GaugeConfig,
    font: Option<&Font<'static>>,
) -> Scene {
    let mut scene = Scene::new();
    scene.add_command(DrawCommand::Clear(config.background_color));

    let gauge = layout.gauge;
    let viewport = Viewport::fit(DESIGN_BOUNDS, gauge.x, gauge.y, gauge.w, gauge.h);
    add_dial(&mut scene, &viewport);
    add_needle(&mut scene, &viewport, state.needle_angle);
    add_readout(&mut scene, layout, state, font);
    add_control_card(&mut scene, layout, state, config);
    scene
}

fn add_dial(scene: &mut Scene, vp: &Viewport) {
    let center = vp.point(CENTER);
    let (rx, ry) = fill_gradient_radii();
    scene.add_command(DrawCommand::GradientHalfAnnulus {
        cx: center.x,
        cy: center.y,
        inner_radius: vp.length(MAIN_ARC_INNER_RADIUS),
        outer_radius: vp.length(MAIN_ARC_RADIUS),
        gradient_rx: vp.length(rx),
        gradient_ry: vp.length(ry),
        stops: FILL_STOPS.to_vec(),
    });

    for band in &BANDS {
        scene.add_command(DrawCommand::Arc {
            cx: center.x,
            cy: center.y,
            radius: vp.length(OUTER_RADIUS),
            width: vp.length(BAND_STROKE_WIDTH),
            start_angle: band.start_angle,
            end_angle: band.end_angle,
            round_caps: true,
            color: band.color,
        });
        let anchor = vp.point(band_label_anchor(band.level));
        scene.add_command(DrawCommand::Text {
            x: anchor.x,
            y: anchor.y,
            text: band.level.label().to_string(),
            font_size: vp.length(13.0),
            anchor: TextAnchor::Middle,
            color: palette::SLATE_800,
        });
    }

    for tick in ticks() {
        let (inner, outer) = (vp.point(tick.inner), vp.point(tick.outer));
        scene.add_command(DrawCommand::Line {
            x0: inner.x,
            y0: inner.y,
            x1: outer.x,
            y1: outer.y,
            thickness: vp.length(TICK_STROKE_WIDTH),
            color: palette::WHITE,
            alpha: TICK_OPACITY,
        });
    }
}

fn add_needle(scene: &mut Scene, vp: &Viewport, angle: f64) {
    let outline = needle_polygon(angle).map(|p| vp.point(p));
    let shadow_dy = vp.length(NEEDLE_SHADOW_OFFSET);
    scene.add_command(DrawCommand::Polygon {
        points: outline.iter().map(|p| (p.x, p.y + shadow_dy)).collect(),
        color: palette::SHADOW,
        alpha: NEEDLE_SHADOW_OPACITY,
    });
    scene.add_command(DrawCommand::Polygon {
        points: outline.iter().map(|p| (p.x, p.y)).collect(),
        color: palette::NEEDLE,
        alpha: 1.0,
    });

    let center = vp.point(CENTER);
    for (radius, color) in [
        (HUB_OUTER_RADIUS, palette::NEEDLE),
        (HUB_INNER_RADIUS, palette::HUB_INNER),
    ] {
        scene.add_command(DrawCommand::Circle {
            cx: center.x,
            cy: center.y,
            radius: vp.length(radius),
            color,
            alpha: 1.0,
        });
    }
}

/// Splits on single quotes; odd segments are the highlighted link text.
pub fn subtitle_segments(subtitle: &str) -> Vec<(&str, bool)> {
    subtitle
        .split('\'')
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| (part, i % 2 == 1))
        .collect()
}

fn measure(text: &str, font: Option<&Font<'static>>, size: f64) -> f64 {
    match font {
        Some(font) => text_width(text, font, size),
        None => text.chars().count() as f64 * size * 0.6,
    }
}

fn add_readout(scene: &mut Scene, layout: &Layout, state: &FrameState, font: Option<&Font<'static>>) {
    let level = state.score.level();
    let value_size = layout.scaled(56.0);
    let value_text = state.score.to_string();
    let value_width = measure(&value_text, font, value_size);
    let dot_radius = layout.scaled(8.0);
    let gap = layout.scaled(12.0);

    let (mid_x, value_y) = layout.point(DESIGN_MID_X, 378.0);
    let left = mid_x - (value_width + dot_radius * 2.0 + gap) / 2.0;
    scene.add_command(DrawCommand::Circle {
        cx: left + dot_radius,
        cy: value_y,
        radius: dot_radius,
        color: level.color(),
        alpha: state.pulse,
    });
    scene.add_command(DrawCommand::Text {
        x: left + dot_radius * 2.0 + gap,
        y: value_y,
        text: value_text,
        font_size: value_size,
        anchor: TextAnchor::Start,
        color: palette::SLATE_900,
    });

    let (_, level_y) = layout.point(DESIGN_MID_X, 424.0);
    scene.add_command(DrawCommand::Text {
        x: mid_x,
        y: level_y,
        text: format!("{} SCORE", level.label().to_uppercase()),
        font_size: layout.scaled(14.0),
        anchor: TextAnchor::Middle,
        color: palette::SLATE_400,
    });

    let subtitle_size = layout.scaled(12.0);
    let segments = subtitle_segments(state.subtitle);
    let total: f64 = segments
        .iter()
        .map(|(text, _)| measure(text, font, subtitle_size))
        .sum();
    let (_, subtitle_y) = layout.point(DESIGN_MID_X, 456.0);
    let mut x = mid_x - total / 2.0;
    for (text, highlighted) in segments {
        let color = if highlighted {
            palette::INDIGO_500
        } else {
            palette::SLATE_400
        };
        scene.add_command(DrawCommand::Text {
            x,
            y: subtitle_y,
            text: text.to_string(),
            font_size: subtitle_size,
            anchor: TextAnchor::Start,
            color,
        });
        x += measure(text, font, subtitle_size);
    }
}

fn add_control_card(scene: &mut Scene, layout: &Layout, state: &FrameState, config: &GaugeConfig) {
    let card = layout.card;
    let shadow = Rect::new(card.x, card.y + layout.scaled(8.0), card.w, card.h);
    scene.add_command(DrawCommand::RoundedRect {
        rect: shadow,
        radius: layout.scaled(32.0),
        fill: palette::SLATE_400,
        alpha: 0.12,
        border: None,
    });
    scene.add_command(DrawCommand::RoundedRect {
        rect: card,
        radius: layout.scaled(32.0),
        fill: palette::WHITE,
        alpha: 1.0,
        border: Some(palette::SLATE_100),
    });

    let (title_x, title_y) = layout.point(52.0, 520.0);
    add_text(scene, title_x, title_y, "Precision Control", layout.scaled(20.0), TextAnchor::Start, palette::SLATE_800);
    let (_, hint_y) = layout.point(52.0, 546.0);
    add_text(scene, title_x, hint_y, "Test needle fluid dynamics", layout.scaled(13.0), TextAnchor::Start, palette::SLATE_400);

    // Scan toggle
    let scanning = state.scan.is_auto();
    let (fill, border, label_color, label) = if scanning {
        (palette::RED_50, Some(palette::RED_100), palette::RED_600, "Stop Scanning")
    } else {
        (config.accent_color, None, palette::WHITE, "Start Smooth Scan")
    };
    scene.add_command(DrawCommand::RoundedRect {
        rect: layout.scan_button,
        radius: layout.scaled(12.0),
        fill,
        alpha: 1.0,
        border,
    });
    let (bx, by) = layout.scan_button.center();
    add_text(scene, bx, by, label, layout.scaled(14.0), TextAnchor::Middle, label_color);

    // Manual input
    let (_, input_y) = layout.point(52.0, 598.0);
    add_text(scene, title_x, input_y, "MANUAL INPUT", layout.scaled(11.0), TextAnchor::Start, palette::SLATE_400);
    let (value_x, _) = layout.point(508.0, 598.0);
    add_text(scene, value_x, input_y, &state.score.to_string(), layout.scaled(22.0), TextAnchor::End, palette::SLATE_800);

    add_slider(scene, layout, state, config.accent_color);

    for (value, rect) in layout.presets {
        let active = !scanning && state.score.value() == value;
        scene.add_command(DrawCommand::RoundedRect {
            rect,
            radius: layout.scaled(12.0),
            fill: if active { palette::WHITE } else { palette::SLATE_50 },
            alpha: 1.0,
            border: Some(if active { config.accent_color } else { palette::SLATE_100 }),
        });
        let (cx, cy) = rect.center();
        let color = if active { config.accent_color } else { palette::SLATE_500 };
        add_text(scene, cx, cy, &format!("SET {value}%"), layout.scaled(11.0), TextAnchor::Middle, color);
    }

    let (footer_x, footer_y) = layout.point(DESIGN_MID_X, 772.0);
    add_text(
        scene,
        footer_x,
        footer_y,
        &format!("ENGINEERED FOR SMOOTHNESS • {} FPS ANIMATION", config.max_framerate.round()),
        layout.scaled(11.0),
        TextAnchor::Middle,
        palette::SLATE_300,
    );
}

fn add_slider(scene: &mut Scene, layout: &Layout, state: &FrameState, accent: Color) {
    let track = layout.slider_track;
    scene.add_command(DrawCommand::RoundedRect {
        rect: track,
        radius: track.h / 2.0,
        fill: palette::SLATE_100,
        alpha: 1.0,
        border: None,
    });
    let knob_x = layout.slider_x(state.score.value());
    if knob_x > track.x {
        scene.add_command(DrawCommand::RoundedRect {
            rect: Rect::new(track.x, track.y, knob_x - track.x, track.h),
            radius: track.h / 2.0,
            fill: accent,
            alpha: 1.0,
            border: None,
        });
    }
    let knob_radius = layout.scaled(if state.dragging { 11.0 } else { 9.0 });
    let (_, knob_y) = track.center();
    scene.add_command(DrawCommand::Circle {
        cx: knob_x,
        cy: knob_y,
        radius: knob_radius,
        color: accent,
        alpha: 1.0,
    });
    scene.add_command(DrawCommand::Circle {
        cx: knob_x,
        cy: knob_y,
        radius: knob_radius * 0.45,
        color: palette::WHITE,
        alpha: 1.0,
    });
}

fn add_text(
    scene: &mut Scene,
    x: f64,
    y: f64,
    text: &str,
    font_size: f64,
    anchor: TextAnchor,
    color: Color,
) {
    scene.add_command(DrawCommand::Text {
        x,
        y,
        text: text.to_string(),
        font_size,
        anchor,
        color,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TICK_COUNT;

    fn state(score: u8, scan: ScanMode) -> FrameState<'static> {
        FrameState {
            score: Score::new(score),
            scan,
            needle_angle: crate::geometry::needle_angle(Score::new(score)),
            pulse: 1.0,
            dragging: false,
            subtitle: "See the 'Details' tab.",
        }
    }

    fn texts(scene: &Scene) -> Vec<String> {
        scene
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn dial_has_fill_bands_and_ticks() {
        let layout = Layout::new(560, 800);
        let scene = compose(&layout, &state(42, ScanMode::Manual), &GaugeConfig::default(), None);
        let commands = scene.commands();
        assert!(matches!(commands[0], DrawCommand::Clear(_)));
        let gradients = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::GradientHalfAnnulus { .. }))
            .count();
        let arcs = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Arc { .. }))
            .count();
        let ticks = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { color, .. } if *color == palette::WHITE))
            .count();
        assert_eq!(gradients, 1);
        assert_eq!(arcs, 3);
        assert_eq!(ticks, TICK_COUNT);
    }

    #[test]
    fn readout_reflects_score_and_level() {
        let layout = Layout::new(560, 800);
        let scene = compose(&layout, &state(70, ScanMode::Manual), &GaugeConfig::default(), None);
        let texts = texts(&scene);
        assert!(texts.contains(&"70%".to_string()));
        assert!(texts.contains(&"UNRELIABLE SCORE".to_string()));
        assert!(texts.contains(&"Start Smooth Scan".to_string()));
        assert!(texts.contains(&"SET 88%".to_string()));
    }

    #[test]
    fn scan_button_label_follows_mode() {
        let layout = Layout::new(560, 800);
        let scene = compose(&layout, &state(50, ScanMode::Auto), &GaugeConfig::default(), None);
        assert!(texts(&scene).contains(&"Stop Scanning".to_string()));
    }

    #[test]
    fn indicator_dot_uses_level_color_and_pulse() {
        let layout = Layout::new(560, 800);
        let mut frame = state(10, ScanMode::Manual);
        frame.pulse = 0.5;
        let scene = compose(&layout, &frame, &GaugeConfig::default(), None);
        let dot = scene.commands().iter().find_map(|c| match c {
            DrawCommand::Circle { color, alpha, .. } if *color == Score::new(10).level().color() => Some(*alpha),
            _ => None,
        });
        assert_eq!(dot, Some(0.5));
    }

    #[test]
    fn subtitle_highlights_quoted_text() {
        let segments = subtitle_segments("check out the 'Details' tab.");
        assert_eq!(
            segments,
            vec![("check out the ", false), ("Details", true), (" tab.", false)]
        );
        assert!(subtitle_segments("").is_empty());
    }

    #[test]
    fn render_frame_paints_background_and_needle() {
        let (width, height) = (1120, 1600);
        let mut frame = vec![0u8; width * height * 4];
        let mut canvas = Canvas::new(&mut frame, width, height);
        let config = GaugeConfig::default();
        render_frame(&mut canvas, &state(50, ScanMode::Manual), &config, None);

        let bg = config.background_color;
        assert_eq!(canvas.pixel(0, 0), Some([bg.r, bg.g, bg.b, 0xff]));

        // Needle points straight up at 50: a pixel just above the hub is needle-coloured.
        let layout = Layout::new(width, height);
        let g = layout.gauge;
        let vp = Viewport::fit(DESIGN_BOUNDS, g.x, g.y, g.w, g.h);
        let probe = vp.point(crate::geometry::Point::new(CENTER.x, CENTER.y - 40.0));
        let pixel = canvas.pixel(probe.x as usize, probe.y as usize);
        let n = palette::NEEDLE;
        assert_eq!(pixel, Some([n.r, n.g, n.b, 0xff]));
    }

    #[test]
    fn missing_font_is_not_an_error() {
        assert!(load_font(None).unwrap().is_none());
        let err = load_font(Some(Path::new("/definitely/not/here.ttf"))).unwrap_err();
        assert!(matches!(err, GaugeError::FontRead { .. }));
    }
}
