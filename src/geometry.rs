//! Gauge geometry in design units.
//!
//! The gauge is laid out in a 400×240 design space with the pivot at (200, 220).
//! Angles are screen angles in degrees, measured clockwise from +x (y grows
//! downwards), so the visible half-dial runs from −180° (left) through −90°
//! (top) to 0° (right). Needle angles use the needle's own frame instead: 0° is
//! straight up, −90° points left and +90° points right.

use crate::config::{palette, Color};
use crate::score::{ReliabilityLevel, Score};

pub const VIEW_WIDTH: f64 = 400.0;
pub const VIEW_HEIGHT: f64 = 240.0;

pub const CENTER: Point = Point::new(200.0, 220.0);

pub const OUTER_RADIUS: f64 = 210.0;
pub const BAND_STROKE_WIDTH: f64 = 8.0;
pub const GAP_BETWEEN_ARCS: f64 = 15.0;
pub const MAIN_ARC_RADIUS: f64 = OUTER_RADIUS - GAP_BETWEEN_ARCS;
pub const MAIN_ARC_INNER_RADIUS: f64 = 70.0;

pub const TICK_COUNT: usize = 61;
pub const TICK_LENGTH: f64 = 8.0;
pub const TICK_STROKE_WIDTH: f64 = 1.5;
pub const TICK_OPACITY: f64 = 0.9;

pub const NEEDLE_TIP_RADIUS: f64 = 205.0;
pub const NEEDLE_BASE_RADIUS: f64 = 15.0;
pub const NEEDLE_HALF_WIDTH: f64 = 3.5;
pub const NEEDLE_SHADOW_OFFSET: f64 = 2.0;
pub const NEEDLE_SHADOW_OPACITY: f64 = 0.3;

pub const HUB_OUTER_RADIUS: f64 = 18.0;
pub const HUB_INNER_RADIUS: f64 = 7.0;

/// Area around the dial, in design units, that the viewport must keep visible.
/// Wider than the view box so the band labels fit beside the arc.
pub const DESIGN_BOUNDS: Bounds = Bounds {
    min_x: -70.0,
    min_y: -40.0,
    max_x: 470.0,
    max_y: VIEW_HEIGHT,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at `radius` from `self` along screen angle `degrees`.
    pub fn polar(self, radius: f64, degrees: f64) -> Point {
        let rad = degrees.to_radians();
        Point::new(self.x + radius * rad.cos(), self.y + radius * rad.sin())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

// ============================================================================
// VALUE MAPPING
// ============================================================================

/// Linear map of `0..=100` onto `-90°..=90°`.
pub fn needle_angle(score: Score) -> f64 {
    score.fraction() * 180.0 - 90.0
}

/// Screen angle the needle points along for a needle angle.
pub fn needle_screen_angle(needle_deg: f64) -> f64 {
    needle_deg - 90.0
}

/// Needle outline (tip, then the two base corners) rotated by `needle_deg` about the pivot.
pub fn needle_polygon(needle_deg: f64) -> [Point; 3] {
    let rad = needle_deg.to_radians();
    let (sin, cos) = rad.sin_cos();
    let rotate = |x: f64, y: f64| Point::new(CENTER.x + x * cos - y * sin, CENTER.y + x * sin + y * cos);
    [
        rotate(0.0, -NEEDLE_TIP_RADIUS),
        rotate(NEEDLE_HALF_WIDTH, -NEEDLE_BASE_RADIUS),
        rotate(-NEEDLE_HALF_WIDTH, -NEEDLE_BASE_RADIUS),
    ]
}

// ============================================================================
// STATIC DIAL FURNITURE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub angle: f64,
    pub inner: Point,
    pub outer: Point,
}

/// `TICK_COUNT` evenly spaced ticks from −180° to 0°, on the rim of the filled area.
pub fn ticks() -> Vec<Tick> {
    (0..TICK_COUNT)
        .map(|i| {
            let angle = (i as f64 / (TICK_COUNT as f64 - 1.0)) * 180.0 - 180.0;
            Tick {
                angle,
                inner: CENTER.polar(MAIN_ARC_RADIUS - TICK_LENGTH, angle),
                outer: CENTER.polar(MAIN_ARC_RADIUS, angle),
            }
        })
        .collect()
}

/// A coloured stroke along the outer rim, static regardless of the score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub level: ReliabilityLevel,
    pub start_angle: f64,
    pub end_angle: f64,
    pub color: Color,
}

impl Band {
    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }
}

/// Three near-equal thirds of the sweep with a small gap between neighbours.
pub const BANDS: [Band; 3] = [
    Band {
        level: ReliabilityLevel::Reliable,
        start_angle: -180.0,
        end_angle: -116.6,
        color: palette::BAND_GREEN,
    },
    Band {
        level: ReliabilityLevel::Fuzzy,
        start_angle: -111.8,
        end_angle: -68.2,
        color: palette::BAND_YELLOW,
    },
    Band {
        level: ReliabilityLevel::Unreliable,
        start_angle: -63.4,
        end_angle: 0.0,
        color: palette::BAND_RED,
    },
];

/// Where each band's caption sits, in design units.
pub fn band_label_anchor(level: ReliabilityLevel) -> Point {
    match level {
        ReliabilityLevel::Reliable => CENTER.polar(OUTER_RADIUS + 24.0, -168.0),
        ReliabilityLevel::Fuzzy => CENTER.polar(OUTER_RADIUS + 22.0, -90.0),
        ReliabilityLevel::Unreliable => CENTER.polar(OUTER_RADIUS + 24.0, -12.0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Color,
    pub opacity: f64,
}

/// Fill of the half-annulus under the ticks.
pub const FILL_STOPS: [GradientStop; 3] = [
    GradientStop {
        offset: 0.0,
        color: Color::from_hex(0x81c784),
        opacity: 0.1,
    },
    GradientStop {
        offset: 0.6,
        color: Color::from_hex(0x66bb6a),
        opacity: 0.4,
    },
    GradientStop {
        offset: 1.0,
        color: Color::from_hex(0x4caf50),
        opacity: 0.8,
    },
];

/// Gradient radii: the fill's bounding box is `2R × R`, and the gradient is
/// centred on the bottom middle with a radius of 100 % on each axis.
pub fn fill_gradient_radii() -> (f64, f64) {
    (2.0 * MAIN_ARC_RADIUS, MAIN_ARC_RADIUS)
}

/// Colour and opacity of the fill at normalised gradient distance `t`.
pub fn sample_gradient(stops: &[GradientStop], t: f64) -> (Color, f64) {
    let Some(first) = stops.first() else {
        return (palette::WHITE, 0.0);
    };
    if t <= first.offset {
        return (first.color, first.opacity);
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            let local = if span > 0.0 { (t - a.offset) / span } else { 1.0 };
            return (a.color.mix(b.color, local), a.opacity + (b.opacity - a.opacity) * local);
        }
    }
    let last = stops[stops.len() - 1];
    (last.color, last.opacity)
}

// ============================================================================
// VIEWPORT
// ============================================================================

/// Uniform scale and offset from design units to pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Viewport {
    /// Fits `bounds` inside the pixel rectangle, centred, preserving aspect ratio.
    pub fn fit(bounds: Bounds, x: f64, y: f64, width: f64, height: f64) -> Self {
        let scale = (width / bounds.width()).min(height / bounds.height()).max(0.0);
        let offset_x = x + (width - bounds.width() * scale) / 2.0 - bounds.min_x * scale;
        let offset_y = y + (height - bounds.height() * scale) / 2.0 - bounds.min_y * scale;
        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    pub fn point(&self, p: Point) -> Point {
        Point::new(self.offset_x + p.x * self.scale, self.offset_y + p.y * self.scale)
    }

    pub fn length(&self, len: f64) -> f64 {
        len * self.scale
    }
}
