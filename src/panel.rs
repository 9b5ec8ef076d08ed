//! Layout of the window and translation of pointer/keyboard input into
//! controller actions.

use winit::keyboard::{Key, NamedKey};

use crate::scene::Rect;

/// Size of the reference layout; the real window scales it uniformly.
pub const DESIGN_WIDTH: f64 = 560.0;
pub const DESIGN_HEIGHT: f64 = 800.0;

/// Values offered by the preset buttons.
pub const PRESETS: [u8; 3] = [12, 50, 88];

/// Extra vertical reach of the slider's hit area, in design units.
const SLIDER_GRAB_MARGIN: f64 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    ToggleScan,
    Preset(u8),
    /// Pointer landed on the slider at this value.
    Slide(f64),
    Nudge(i32),
    Quit,
}

/// Pixel rectangles of every region, derived from the framebuffer size.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub scale: f64,
    origin: (f64, f64),
    pub gauge: Rect,
    pub card: Rect,
    pub scan_button: Rect,
    pub slider_track: Rect,
    pub presets: [(u8, Rect); 3],
}

impl Layout {
    pub fn new(width: usize, height: usize) -> Self {
        let (w, h) = (width as f64, height as f64);
        let scale = (w / DESIGN_WIDTH).min(h / DESIGN_HEIGHT).max(0.0);
        let origin = (
            (w - DESIGN_WIDTH * scale) / 2.0,
            (h - DESIGN_HEIGHT * scale) / 2.0,
        );
        let mut layout = Self {
            scale,
            origin,
            gauge: Rect::new(0.0, 0.0, 0.0, 0.0),
            card: Rect::new(0.0, 0.0, 0.0, 0.0),
            scan_button: Rect::new(0.0, 0.0, 0.0, 0.0),
            slider_track: Rect::new(0.0, 0.0, 0.0, 0.0),
            presets: [(0, Rect::new(0.0, 0.0, 0.0, 0.0)); 3],
        };
        layout.gauge = layout.rect(24.0, 36.0, 512.0, 290.0);
        layout.card = layout.rect(24.0, 480.0, 512.0, 260.0);
        layout.scan_button = layout.rect(318.0, 508.0, 190.0, 44.0);
        layout.slider_track = layout.rect(52.0, 624.0, 456.0, 6.0);
        for (i, value) in PRESETS.iter().enumerate() {
            let x = 52.0 + i as f64 * 156.0;
            layout.presets[i] = (*value, layout.rect(x, 660.0, 144.0, 52.0));
        }
        layout
    }

    /// Design-space point to pixels.
    pub fn point(&self, x: f64, y: f64) -> (f64, f64) {
        (self.origin.0 + x * self.scale, self.origin.1 + y * self.scale)
    }

    /// Design-space length to pixels.
    pub fn scaled(&self, v: f64) -> f64 {
        v * self.scale
    }

    fn rect(&self, x: f64, y: f64, w: f64, h: f64) -> Rect {
        let (px, py) = self.point(x, y);
        Rect::new(px, py, self.scaled(w), self.scaled(h))
    }

    fn slider_hit_area(&self) -> Rect {
        let margin = self.scaled(SLIDER_GRAB_MARGIN);
        self.slider_track.inflate(margin / 2.0, margin)
    }

    /// Slider value under pixel column `x`, clamped to `0..=100`.
    pub fn slider_value(&self, x: f64) -> f64 {
        let track = self.slider_track;
        if track.w <= 0.0 {
            return 0.0;
        }
        (((x - track.x) / track.w) * 100.0).clamp(0.0, 100.0).round()
    }

    /// Pixel column of the slider knob for `value`.
    pub fn slider_x(&self, value: u8) -> f64 {
        self.slider_track.x + self.slider_track.w * f64::from(value.min(100)) / 100.0
    }

    pub fn hit_test(&self, x: f64, y: f64) -> Option<ControlAction> {
        if self.scan_button.contains(x, y) {
            return Some(ControlAction::ToggleScan);
        }
        if self.slider_hit_area().contains(x, y) {
            return Some(ControlAction::Slide(self.slider_value(x)));
        }
        self.presets
            .iter()
            .find(|(_, rect)| rect.contains(x, y))
            .map(|(value, _)| ControlAction::Preset(*value))
    }
}

/// Keyboard shortcuts: Space scans, 1/2/3 pick presets, arrows nudge, Escape quits.
pub fn key_action(key: &Key) -> Option<ControlAction> {
    match key {
        Key::Named(NamedKey::Space) => Some(ControlAction::ToggleScan),
        Key::Named(NamedKey::ArrowLeft) | Key::Named(NamedKey::ArrowDown) => {
            Some(ControlAction::Nudge(-1))
        }
        Key::Named(NamedKey::ArrowRight) | Key::Named(NamedKey::ArrowUp) => {
            Some(ControlAction::Nudge(1))
        }
        Key::Named(NamedKey::Escape) => Some(ControlAction::Quit),
        Key::Character(c) => match c.as_str() {
            "1" => Some(ControlAction::Preset(PRESETS[0])),
            "2" => Some(ControlAction::Preset(PRESETS[1])),
            "3" => Some(ControlAction::Preset(PRESETS[2])),
            "s" | "S" => Some(ControlAction::ToggleScan),
            "q" | "Q" => Some(ControlAction::Quit),
            _ => None,
        },
        _ => None,
    }
}
