//! Colours, the palette and the builder-style `GaugeConfig`.

use std::path::PathBuf;

use bon::Builder;

use crate::score::Score;

/// Color representation for gauge elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    /// Linear blend towards `other`, `t` in `0.0..=1.0`.
    pub fn mix(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let ch = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Color::new(ch(self.r, other.r), ch(self.g, other.g), ch(self.b, other.b))
    }
}

/// Fixed colours used by the gauge and the control card.
pub mod palette {
    use super::Color;

    pub const WHITE: Color = Color::from_hex(0xffffff);
    pub const SLATE_50: Color = Color::from_hex(0xf8fafc);
    pub const SLATE_100: Color = Color::from_hex(0xf1f5f9);
    pub const SLATE_300: Color = Color::from_hex(0xcbd5e1);
    pub const SLATE_400: Color = Color::from_hex(0x94a3b8);
    pub const SLATE_500: Color = Color::from_hex(0x64748b);
    pub const SLATE_600: Color = Color::from_hex(0x475569);
    pub const SLATE_800: Color = Color::from_hex(0x1e293b);
    pub const SLATE_900: Color = Color::from_hex(0x0f172a);
    pub const INDIGO_500: Color = Color::from_hex(0x6366f1);
    pub const INDIGO_600: Color = Color::from_hex(0x4f46e5);
    pub const RED_50: Color = Color::from_hex(0xfef2f2);
    pub const RED_100: Color = Color::from_hex(0xfee2e2);
    pub const RED_600: Color = Color::from_hex(0xdc2626);

    pub const BAND_GREEN: Color = Color::from_hex(0x27ae60);
    pub const BAND_YELLOW: Color = Color::from_hex(0xf1c40f);
    pub const BAND_RED: Color = Color::from_hex(0xc0392b);

    pub const NEEDLE: Color = SLATE_800;
    pub const HUB_INNER: Color = SLATE_600;
    pub const SHADOW: Color = Color::from_hex(0x000000);
}

/// Everything the window runtime needs; built with `GaugeConfig::builder()`.
#[derive(Debug, Clone, Builder)]
pub struct GaugeConfig {
    #[builder(default = "Trust Indicator".to_string(), into)]
    pub title: String,
    #[builder(
        default = "For further details, including scoring criteria check out the 'Details' tab.".to_string(),
        into
    )]
    pub subtitle: String,

    // Initial controller state
    #[builder(default = 25.0)]
    pub initial_value: f64,
    #[builder(default = false)]
    pub start_scanning: bool,

    // Window configuration
    #[builder(default = 560)]
    pub window_width: usize,
    #[builder(default = 800)]
    pub window_height: usize,
    #[builder(default = 60.0)]
    pub max_framerate: f64,

    // Animation
    #[builder(default = 1200.0)]
    pub needle_transition_ms: f64,
    #[builder(default = 2000.0)]
    pub pulse_period_ms: f64,
    #[builder(default = true)]
    pub pulse_indicator: bool,

    // Colors
    #[builder(default = palette::SLATE_50)]
    pub background_color: Color,
    #[builder(default = palette::INDIGO_600)]
    pub accent_color: Color,

    /// TrueType/OpenType font for labels. Without one only geometry is drawn.
    pub font_path: Option<PathBuf>,
}

impl GaugeConfig {
    pub fn initial_score(&self) -> Score {
        Score::clamped(self.initial_value)
    }

    pub fn frame_duration(&self) -> std::time::Duration {
        let fps = if self.max_framerate.is_finite() && self.max_framerate > 0.0 {
            self.max_framerate
        } else {
            60.0
        };
        std::time::Duration::from_secs_f64(1.0 / fps)
    }
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_the_demo_panel() {
        let config = GaugeConfig::default();
        assert_eq!(config.title, "Trust Indicator");
        assert_eq!(config.initial_score().value(), 25);
        assert!(!config.start_scanning);
        assert_eq!(config.needle_transition_ms, 1200.0);
        assert!(config.font_path.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = GaugeConfig::builder()
            .title("Probe")
            .initial_value(140.0)
            .max_framerate(0.0)
            .font_path(PathBuf::from("/tmp/font.ttf"))
            .build();
        assert_eq!(config.title, "Probe");
        assert_eq!(config.initial_score(), Score::MAX);
        assert_eq!(config.frame_duration(), std::time::Duration::from_secs_f64(1.0 / 60.0));
        assert_eq!(config.font_path.as_deref(), Some(std::path::Path::new("/tmp/font.ttf")));
    }

    #[test]
    fn hex_colors_and_mix() {
        assert_eq!(Color::from_hex(0x27ae60), Color::new(0x27, 0xae, 0x60));
        let black = Color::new(0, 0, 0);
        let white = Color::new(255, 255, 255);
        assert_eq!(black.mix(white, 0.5), Color::new(128, 128, 128));
        assert_eq!(black.mix(white, 2.0), white);
    }
}
