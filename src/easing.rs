//! Time-based easing for the needle sweep and the indicator pulse.

/// CSS-style `cubic-bezier(x1, y1, x2, y2)` timing curve with fixed end points (0,0) and (1,1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

/// Needle swing: `cubic-bezier(0.34, 1.56, 0.64, 1)`, overshoots then settles.
pub const NEEDLE_EASE: CubicBezier = CubicBezier::new(0.34, 1.56, 0.64, 1.0);
/// Indicator pulse: `cubic-bezier(0.4, 0, 0.6, 1)`.
pub const PULSE_EASE: CubicBezier = CubicBezier::new(0.4, 0.0, 0.6, 1.0);

const SOLVE_EPSILON: f64 = 1e-7;

/// Power-basis coefficients `(a, b, c)` of one Bezier coordinate.
fn coefficients(p1: f64, p2: f64) -> (f64, f64, f64) {
    let c = 3.0 * p1;
    let b = 3.0 * (p2 - p1) - c;
    (1.0 - c - b, b, c)
}

impl CubicBezier {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    fn sample_x(&self, t: f64) -> f64 {
        let (a, b, c) = coefficients(self.x1, self.x2);
        ((a * t + b) * t + c) * t
    }

    fn sample_y(&self, t: f64) -> f64 {
        let (a, b, c) = coefficients(self.y1, self.y2);
        ((a * t + b) * t + c) * t
    }

    fn sample_dx(&self, t: f64) -> f64 {
        let (a, b, c) = coefficients(self.x1, self.x2);
        (3.0 * a * t + 2.0 * b) * t + c
    }

    /// Curve parameter whose x equals `x`. Newton first, bisection if it stalls.
    fn solve_t(&self, x: f64) -> f64 {
        let mut t = x;
        for _ in 0..8 {
            let err = self.sample_x(t) - x;
            if err.abs() < SOLVE_EPSILON {
                return t;
            }
            let d = self.sample_dx(t);
            if d.abs() < 1e-6 {
                break;
            }
            t -= err / d;
        }

        let (mut lo, mut hi) = (0.0, 1.0);
        t = x;
        while lo < hi {
            let sx = self.sample_x(t);
            if (sx - x).abs() < SOLVE_EPSILON {
                break;
            }
            if x > sx {
                lo = t;
            } else {
                hi = t;
            }
            let next = (lo + hi) / 2.0;
            if next == t {
                break;
            }
            t = next;
        }
        t
    }

    /// Eased progress for linear progress `x`. Inputs outside `0..=1` are clamped.
    pub fn ease(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        self.sample_y(self.solve_t(x))
    }
}

/// Displayed needle angle easing towards the angle of the latest score.
#[derive(Debug, Clone)]
pub struct NeedleTransition {
    from: f64,
    to: f64,
    started_at: Option<f64>,
    duration_ms: f64,
    easing: CubicBezier,
}

impl NeedleTransition {
    pub fn new(angle: f64, duration_ms: f64) -> Self {
        Self {
            from: angle,
            to: angle,
            started_at: None,
            duration_ms: duration_ms.max(0.0),
            easing: NEEDLE_EASE,
        }
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    /// Starts a new sweep towards `angle` from wherever the needle is drawn at `now_ms`.
    pub fn retarget(&mut self, angle: f64, now_ms: f64) {
        if (angle - self.to).abs() < f64::EPSILON {
            return;
        }
        self.from = self.angle_at(now_ms);
        self.to = angle;
        self.started_at = Some(now_ms);
    }

    fn progress(&self, now_ms: f64) -> Option<f64> {
        let started = self.started_at?;
        if self.duration_ms <= 0.0 {
            return Some(1.0);
        }
        Some(((now_ms - started) / self.duration_ms).clamp(0.0, 1.0))
    }

    pub fn angle_at(&self, now_ms: f64) -> f64 {
        match self.progress(now_ms) {
            Some(p) => self.from + (self.to - self.from) * self.easing.ease(p),
            None => self.to,
        }
    }

    pub fn is_animating(&self, now_ms: f64) -> bool {
        self.progress(now_ms).is_some_and(|p| p < 1.0)
    }

    /// Drops a finished sweep so later reads skip the curve.
    pub fn settle(&mut self, now_ms: f64) {
        if self.started_at.is_some() && !self.is_animating(now_ms) {
            self.from = self.to;
            self.started_at = None;
        }
    }
}

/// Opacity of the indicator dot: 1 → 0.5 → 1 once per `period_ms`.
pub fn pulse_opacity(now_ms: f64, period_ms: f64) -> f64 {
    if period_ms <= 0.0 || !now_ms.is_finite() {
        return 1.0;
    }
    let phase = now_ms.rem_euclid(period_ms) / period_ms;
    if phase < 0.5 {
        1.0 - 0.5 * PULSE_EASE.ease(phase * 2.0)
    } else {
        0.5 + 0.5 * PULSE_EASE.ease((phase - 0.5) * 2.0)
    }
}
