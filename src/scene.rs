//! Retained-mode draw list and the software rasteriser that paints it into
//! an RGBA framebuffer.

use rusttype::{point, Font, PositionedGlyph, Scale};

use crate::config::Color;
use crate::geometry::{sample_gradient, GradientStop};

/// Horizontal placement of a text run relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.w && y >= self.y && y <= self.y + self.h
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn inflate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x - dx, self.y - dy, self.w + 2.0 * dx, self.h + 2.0 * dy)
    }
}

#[derive(Clone, Debug)]
pub enum DrawCommand {
    Clear(Color),
    /// Stroke along a circle between two screen angles (degrees, clockwise).
    Arc {
        cx: f64,
        cy: f64,
        radius: f64,
        width: f64,
        start_angle: f64,
        end_angle: f64,
        round_caps: bool,
        color: Color,
    },
    /// Upper half of an annulus filled with an elliptical radial gradient
    /// centred on the pivot.
    GradientHalfAnnulus {
        cx: f64,
        cy: f64,
        inner_radius: f64,
        outer_radius: f64,
        gradient_rx: f64,
        gradient_ry: f64,
        stops: Vec<GradientStop>,
    },
    Line {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        thickness: f64,
        color: Color,
        alpha: f64,
    },
    /// Convex polygon.
    Polygon {
        points: Vec<(f64, f64)>,
        color: Color,
        alpha: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        radius: f64,
        color: Color,
        alpha: f64,
    },
    RoundedRect {
        rect: Rect,
        radius: f64,
        fill: Color,
        alpha: f64,
        border: Option<Color>,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        font_size: f64,
        anchor: TextAnchor,
        color: Color,
    },
}

#[derive(Debug, Default)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn add_command(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Text commands are skipped when no font is loaded.
    pub fn render(&self, canvas: &mut Canvas, font: Option<&Font<'static>>) {
        for command in &self.commands {
            match command {
                DrawCommand::Clear(color) => canvas.clear(*color),
                DrawCommand::Arc {
                    cx,
                    cy,
                    radius,
                    width,
                    start_angle,
                    end_angle,
                    round_caps,
                    color,
                } => draw_arc(
                    canvas,
                    *cx,
                    *cy,
                    *radius,
                    *width,
                    *start_angle,
                    *end_angle,
                    *round_caps,
                    *color,
                ),
                DrawCommand::GradientHalfAnnulus {
                    cx,
                    cy,
                    inner_radius,
                    outer_radius,
                    gradient_rx,
                    gradient_ry,
                    stops,
                } => draw_gradient_half_annulus(
                    canvas,
                    *cx,
                    *cy,
                    *inner_radius,
                    *outer_radius,
                    (*gradient_rx, *gradient_ry),
                    stops,
                ),
                DrawCommand::Line {
                    x0,
                    y0,
                    x1,
                    y1,
                    thickness,
                    color,
                    alpha,
                } => draw_thick_line_aa(canvas, *x0, *y0, *x1, *y1, *thickness, *color, *alpha),
                DrawCommand::Polygon {
                    points,
                    color,
                    alpha,
                } => draw_convex_polygon(canvas, points, *color, *alpha),
                DrawCommand::Circle {
                    cx,
                    cy,
                    radius,
                    color,
                    alpha,
                } => draw_circle(canvas, *cx, *cy, *radius, *color, *alpha),
                DrawCommand::RoundedRect {
                    rect,
                    radius,
                    fill,
                    alpha,
                    border,
                } => draw_rounded_rect(canvas, *rect, *radius, *fill, *alpha, *border),
                DrawCommand::Text {
                    x,
                    y,
                    text,
                    font_size,
                    anchor,
                    color,
                } => {
                    if let Some(font) = font {
                        draw_text(canvas, *x, *y, text, font, *font_size, *anchor, *color);
                    }
                }
            }
        }
    }
}

// ============================================================================
// CANVAS
// ============================================================================

/// RGBA8 framebuffer view.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
}

impl<'a> Canvas<'a> {
    /// `frame` must hold `width * height` RGBA pixels; a shorter buffer clips the height.
    pub fn new(frame: &'a mut [u8], width: usize, height: usize) -> Self {
        let height = if width == 0 {
            0
        } else {
            height.min(frame.len() / (width * 4))
        };
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self, color: Color) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.r, color.g, color.b, 0xff]);
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 4;
        let mut out = [0; 4];
        out.copy_from_slice(&self.frame[idx..idx + 4]);
        Some(out)
    }

    /// Source-over blend of `color` at coverage `alpha`. Out-of-bounds writes are dropped.
    pub fn blend(&mut self, x: i64, y: i64, color: Color, alpha: f64) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let a = alpha.clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        let mix = |src: u8, dst: u8| (f64::from(src) * a + f64::from(dst) * (1.0 - a)).round() as u8;
        let out = [
            mix(color.r, self.frame[idx]),
            mix(color.g, self.frame[idx + 1]),
            mix(color.b, self.frame[idx + 2]),
            0xff,
        ];
        self.frame[idx..idx + 4].copy_from_slice(&out);
    }

    /// Pixel range covering `[min, max]` on both axes, clipped to the canvas.
    fn clip(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> (i64, i64, i64, i64) {
        let x0 = (min_x.floor() as i64).max(0);
        let y0 = (min_y.floor() as i64).max(0);
        let x1 = (max_x.ceil() as i64).min(self.width as i64 - 1);
        let y1 = (max_y.ceil() as i64).min(self.height as i64 - 1);
        (x0, y0, x1, y1)
    }
}

/// Coverage of a pixel whose centre is `distance` outside an edge (negative = inside).
fn edge_coverage(distance: f64) -> f64 {
    (0.5 - distance).clamp(0.0, 1.0)
}

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

fn draw_arc(
    canvas: &mut Canvas,
    cx: f64,
    cy: f64,
    radius: f64,
    width: f64,
    start_angle: f64,
    end_angle: f64,
    round_caps: bool,
    color: Color,
) {
    let half = width / 2.0;
    let reach = radius + half + 1.0;
    let sweep = (end_angle - start_angle).clamp(0.0, 360.0);
    let start_cap = (
        cx + radius * start_angle.to_radians().cos(),
        cy + radius * start_angle.to_radians().sin(),
    );
    let end_cap = (
        cx + radius * end_angle.to_radians().cos(),
        cy + radius * end_angle.to_radians().sin(),
    );

    let (x0, y0, x1, y1) = canvas.clip(cx - reach, cy - reach, cx + reach, cy + reach);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
            let (dx, dy) = (px - cx, py - cy);
            let angle = dy.atan2(dx).to_degrees();
            let within = (angle - start_angle).rem_euclid(360.0) <= sweep;
            let distance = if within {
                (dx.hypot(dy) - radius).abs()
            } else if round_caps {
                (px - start_cap.0)
                    .hypot(py - start_cap.1)
                    .min((px - end_cap.0).hypot(py - end_cap.1))
            } else {
                continue;
            };
            let coverage = edge_coverage(distance - half);
            if coverage > 0.0 {
                canvas.blend(x, y, color, coverage);
            }
        }
    }
}

fn draw_gradient_half_annulus(
    canvas: &mut Canvas,
    cx: f64,
    cy: f64,
    inner_radius: f64,
    outer_radius: f64,
    (rx, ry): (f64, f64),
    stops: &[GradientStop],
) {
    if rx <= 0.0 || ry <= 0.0 {
        return;
    }
    let (x0, y0, x1, y1) = canvas.clip(
        cx - outer_radius - 1.0,
        cy - outer_radius - 1.0,
        cx + outer_radius + 1.0,
        cy + 1.0,
    );
    for y in y0..=y1 {
        for x in x0..=x1 {
            let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
            let (dx, dy) = (px - cx, py - cy);
            let dist = dx.hypot(dy);
            let coverage = edge_coverage(dist - outer_radius)
                * edge_coverage(inner_radius - dist)
                * edge_coverage(dy);
            if coverage <= 0.0 {
                continue;
            }
            let t = ((dx / rx).powi(2) + (dy / ry).powi(2)).sqrt();
            let (color, opacity) = sample_gradient(stops, t);
            canvas.blend(x, y, color, coverage * opacity);
        }
    }
}

fn draw_thick_line_aa(
    canvas: &mut Canvas,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    thickness: f64,
    color: Color,
    alpha: f64,
) {
    let half = thickness / 2.0;
    let pad = half + 1.0;
    let (bx0, by0, bx1, by1) = canvas.clip(
        x0.min(x1) - pad,
        y0.min(y1) - pad,
        x0.max(x1) + pad,
        y0.max(y1) + pad,
    );
    let dx = x1 - x0;
    let dy = y1 - y0;
    let len_sq = dx * dx + dy * dy;
    for y in by0..=by1 {
        for x in bx0..=bx1 {
            let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
            let t = if len_sq > 0.0 {
                (((px - x0) * dx + (py - y0) * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (lx, ly) = (x0 + t * dx, y0 + t * dy);
            let dist = (lx - px).hypot(ly - py);
            let coverage = edge_coverage(dist - half);
            if coverage > 0.01 {
                canvas.blend(x, y, color, coverage * alpha);
            }
        }
    }
}

fn draw_convex_polygon(canvas: &mut Canvas, points: &[(f64, f64)], color: Color, alpha: f64) {
    if points.len() < 3 {
        return;
    }
    let signed_area: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.0 * b.1 - b.0 * a.1)
        .sum();
    if signed_area == 0.0 {
        return;
    }
    let orientation = signed_area.signum();

    // Unit inward normals and offsets for each edge.
    let edges: Vec<(f64, f64, f64)> = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .filter_map(|(a, b)| {
            let (ex, ey) = (b.0 - a.0, b.1 - a.1);
            let len = ex.hypot(ey);
            if len == 0.0 {
                return None;
            }
            let (nx, ny) = (-ey * orientation / len, ex * orientation / len);
            Some((nx, ny, nx * a.0 + ny * a.1))
        })
        .collect();

    let (min_x, max_x) = points
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.0), hi.max(p.0)));
    let (min_y, max_y) = points
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
    let (x0, y0, x1, y1) = canvas.clip(min_x - 1.0, min_y - 1.0, max_x + 1.0, max_y + 1.0);

    for y in y0..=y1 {
        for x in x0..=x1 {
            let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
            let inside = edges
                .iter()
                .map(|(nx, ny, d)| nx * px + ny * py - d)
                .fold(f64::MAX, f64::min);
            let coverage = edge_coverage(-inside);
            if coverage > 0.0 {
                canvas.blend(x, y, color, coverage * alpha);
            }
        }
    }
}

fn draw_circle(canvas: &mut Canvas, cx: f64, cy: f64, radius: f64, color: Color, alpha: f64) {
    let (x0, y0, x1, y1) = canvas.clip(cx - radius - 1.0, cy - radius - 1.0, cx + radius + 1.0, cy + radius + 1.0);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dist = (x as f64 + 0.5 - cx).hypot(y as f64 + 0.5 - cy);
            let coverage = edge_coverage(dist - radius);
            if coverage > 0.0 {
                canvas.blend(x, y, color, coverage * alpha);
            }
        }
    }
}

fn draw_rounded_rect(
    canvas: &mut Canvas,
    rect: Rect,
    radius: f64,
    fill: Color,
    alpha: f64,
    border: Option<Color>,
) {
    let radius = radius.clamp(0.0, rect.w.min(rect.h) / 2.0);
    let (cx, cy) = rect.center();
    let (hx, hy) = (rect.w / 2.0 - radius, rect.h / 2.0 - radius);
    let (x0, y0, x1, y1) = canvas.clip(rect.x - 1.0, rect.y - 1.0, rect.right() + 1.0, rect.bottom() + 1.0);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let qx = (x as f64 + 0.5 - cx).abs() - hx;
            let qy = (y as f64 + 0.5 - cy).abs() - hy;
            let outside = qx.max(0.0).hypot(qy.max(0.0));
            let signed = outside + qx.max(qy).min(0.0) - radius;
            let coverage = edge_coverage(signed);
            if coverage <= 0.0 {
                continue;
            }
            canvas.blend(x, y, fill, coverage * alpha);
            if let Some(border) = border {
                let ring = edge_coverage((signed + 0.5).abs() - 0.5);
                canvas.blend(x, y, border, ring.min(coverage));
            }
        }
    }
}

// ============================================================================
// TEXT
// ============================================================================

/// Pixel width of `text` at `font_size`.
pub fn text_width(text: &str, font: &Font, font_size: f64) -> f64 {
    let scale = Scale::uniform(font_size as f32);
    let glyphs: Vec<PositionedGlyph> = font.layout(text, scale, point(0.0, 0.0)).collect();
    match glyphs.last() {
        Some(last) => f64::from(last.position().x + last.unpositioned().h_metrics().advance_width),
        None => 0.0,
    }
}

/// Draws `text` with its vertical centre on `y`.
fn draw_text(
    canvas: &mut Canvas,
    x: f64,
    y: f64,
    text: &str,
    font: &Font,
    font_size: f64,
    anchor: TextAnchor,
    color: Color,
) {
    let scale = Scale::uniform(font_size as f32);
    let v_metrics = font.v_metrics(scale);
    let width = text_width(text, font, font_size);
    let left = match anchor {
        TextAnchor::Start => x,
        TextAnchor::Middle => x - width / 2.0,
        TextAnchor::End => x - width,
    };
    let cap_height = f64::from(v_metrics.ascent + v_metrics.descent);
    let baseline = y + cap_height / 2.0;
    let origin = point(left as f32, baseline as f32);

    for glyph in font.layout(text, scale, origin) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = i64::from(bb.min.x) + i64::from(gx);
                let py = i64::from(bb.min.y) + i64::from(gy);
                canvas.blend(px, py, color, f64::from(v));
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Color = Color::new(0xff, 0xff, 0xff);
    const BLACK: Color = Color::new(0, 0, 0);

    fn render(width: usize, height: usize, commands: Vec<DrawCommand>) -> Vec<u8> {
        let mut frame = vec![0u8; width * height * 4];
        let mut canvas = Canvas::new(&mut frame, width, height);
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Clear(WHITE));
        for command in commands {
            scene.add_command(command);
        }
        scene.render(&mut canvas, None);
        frame
    }

    fn px(frame: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
        let idx = (y * width + x) * 4;
        [frame[idx], frame[idx + 1], frame[idx + 2], frame[idx + 3]]
    }

    #[test]
    fn blend_mixes_and_clips() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut canvas = Canvas::new(&mut frame, 4, 4);
        canvas.clear(WHITE);
        canvas.blend(1, 1, BLACK, 0.5);
        canvas.blend(-1, 2, BLACK, 1.0);
        canvas.blend(9, 9, BLACK, 1.0);
        assert_eq!(canvas.pixel(1, 1), Some([128, 128, 128, 255]));
        assert_eq!(canvas.pixel(0, 2), Some([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(4, 0), None);
    }

    #[test]
    fn short_buffer_clips_height() {
        let mut frame = vec![0u8; 10 * 2 * 4];
        let canvas = Canvas::new(&mut frame, 10, 50);
        assert_eq!(canvas.height(), 2);
    }

    #[test]
    fn circle_fills_centre_not_corner() {
        let frame = render(
            21,
            21,
            vec![DrawCommand::Circle {
                cx: 10.5,
                cy: 10.5,
                radius: 5.0,
                color: BLACK,
                alpha: 1.0,
            }],
        );
        assert_eq!(px(&frame, 21, 10, 10), [0, 0, 0, 255]);
        assert_eq!(px(&frame, 21, 0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn arc_covers_only_its_sweep() {
        let frame = render(
            41,
            41,
            vec![DrawCommand::Arc {
                cx: 20.5,
                cy: 20.5,
                radius: 15.0,
                width: 4.0,
                start_angle: -180.0,
                end_angle: 0.0,
                round_caps: false,
                color: BLACK,
            }],
        );
        // Top of the ring is inside the upper half sweep, bottom is not.
        assert_eq!(px(&frame, 41, 20, 5), [0, 0, 0, 255]);
        assert_eq!(px(&frame, 41, 20, 35), [255, 255, 255, 255]);
        // Centre stays untouched.
        assert_eq!(px(&frame, 41, 20, 20), [255, 255, 255, 255]);
    }

    #[test]
    fn round_caps_extend_past_the_sweep() {
        let arc = |round_caps| DrawCommand::Arc {
            cx: 20.5,
            cy: 20.5,
            radius: 15.0,
            width: 6.0,
            start_angle: -90.0,
            end_angle: 0.0,
            round_caps,
            color: BLACK,
        };
        // Just left of the top end of the sweep.
        let flat = render(41, 41, vec![arc(false)]);
        let round = render(41, 41, vec![arc(true)]);
        assert_eq!(px(&flat, 41, 18, 5), [255, 255, 255, 255]);
        assert_eq!(px(&round, 41, 18, 5), [0, 0, 0, 255]);
    }

    #[test]
    fn polygon_winding_does_not_matter() {
        let cw = vec![(2.0, 2.0), (18.0, 2.0), (10.0, 18.0)];
        let ccw: Vec<_> = cw.iter().rev().copied().collect();
        for points in [cw, ccw] {
            let frame = render(
                20,
                20,
                vec![DrawCommand::Polygon {
                    points,
                    color: BLACK,
                    alpha: 1.0,
                }],
            );
            assert_eq!(px(&frame, 20, 10, 6), [0, 0, 0, 255]);
            assert_eq!(px(&frame, 20, 1, 17), [255, 255, 255, 255]);
        }
    }

    #[test]
    fn gradient_only_fills_upper_half_of_ring() {
        let stops = vec![GradientStop {
            offset: 0.0,
            color: BLACK,
            opacity: 1.0,
        }];
        let frame = render(
            41,
            41,
            vec![DrawCommand::GradientHalfAnnulus {
                cx: 20.0,
                cy: 30.0,
                inner_radius: 5.0,
                outer_radius: 15.0,
                gradient_rx: 30.0,
                gradient_ry: 15.0,
                stops,
            }],
        );
        assert_eq!(px(&frame, 41, 20, 20), [0, 0, 0, 255]);
        assert_eq!(px(&frame, 41, 20, 28), [255, 255, 255, 255]);
        assert_eq!(px(&frame, 41, 20, 35), [255, 255, 255, 255]);
    }

    #[test]
    fn rounded_rect_leaves_corners() {
        let frame = render(
            30,
            30,
            vec![DrawCommand::RoundedRect {
                rect: Rect::new(0.0, 0.0, 30.0, 30.0),
                radius: 10.0,
                fill: BLACK,
                alpha: 1.0,
                border: None,
            }],
        );
        assert_eq!(px(&frame, 30, 15, 15), [0, 0, 0, 255]);
        assert_eq!(px(&frame, 30, 0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn rect_helpers() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert!(r.contains(10.0, 20.0));
        assert!(!r.contains(41.0, 30.0));
        assert_eq!(r.center(), (25.0, 40.0));
        assert!(r.inflate(2.0, 2.0).contains(41.0, 30.0));
    }
}
