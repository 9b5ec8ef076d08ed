//! The gauge's value and its derived reliability band.

use std::fmt;

use crate::config::Color;

/// Upper bound (exclusive) of the reliable band.
pub const RELIABLE_BELOW: u8 = 33;
/// Upper bound (exclusive) of the fuzzy band.
pub const FUZZY_BELOW: u8 = 66;

/// A reading in `0..=100`. Every constructor clamps, so a `Score` is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u8);

impl Score {
    pub const MIN: Score = Score(0);
    pub const MAX: Score = Score(100);

    pub const fn new(value: u8) -> Self {
        if value > 100 {
            Self(100)
        } else {
            Self(value)
        }
    }

    /// Rounds to the nearest integer and clamps into range. NaN maps to zero.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        Self(value.round().clamp(0.0, 100.0) as u8)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Position along the sweep, `0.0..=1.0`.
    pub fn fraction(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    pub const fn level(self) -> ReliabilityLevel {
        ReliabilityLevel::of(self)
    }
}

impl Default for Score {
    fn default() -> Self {
        Self(25)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Three-way classification of a [`Score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReliabilityLevel {
    Reliable,
    Fuzzy,
    Unreliable,
}

impl ReliabilityLevel {
    pub const ALL: [ReliabilityLevel; 3] = [Self::Reliable, Self::Fuzzy, Self::Unreliable];

    pub const fn of(score: Score) -> Self {
        if score.0 < RELIABLE_BELOW {
            Self::Reliable
        } else if score.0 < FUZZY_BELOW {
            Self::Fuzzy
        } else {
            Self::Unreliable
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Reliable => "Reliable",
            Self::Fuzzy => "Fuzzy",
            Self::Unreliable => "Unreliable",
        }
    }

    /// Colour of the readout indicator dot.
    pub const fn color(self) -> Color {
        match self {
            Self::Reliable => Color::new(0x22, 0xc5, 0x5e),
            Self::Fuzzy => Color::new(0xea, 0xb3, 0x08),
            Self::Unreliable => Color::new(0xef, 0x44, 0x44),
        }
    }
}

impl fmt::Display for ReliabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn clamped_stays_in_range_for_random_inputs() {
        let mut rng = rand::rng();
        for _ in 0..10_000 {
            let v: f64 = rng.random_range(-1.0e6..1.0e6);
            let score = Score::clamped(v);
            assert!(score.value() <= 100, "{v} -> {score}");
        }
    }

    #[test]
    fn clamped_handles_edges() {
        assert_eq!(Score::clamped(-5.0), Score::MIN);
        assert_eq!(Score::clamped(250.0), Score::MAX);
        assert_eq!(Score::clamped(f64::NAN), Score::MIN);
        assert_eq!(Score::clamped(f64::INFINITY), Score::MAX);
        assert_eq!(Score::clamped(f64::NEG_INFINITY), Score::MIN);
        assert_eq!(Score::clamped(41.5).value(), 42);
        assert_eq!(Score::new(200), Score::MAX);
    }

    #[test]
    fn default_is_twenty_five() {
        assert_eq!(Score::default().value(), 25);
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(Score::new(0).level(), ReliabilityLevel::Reliable);
        assert_eq!(Score::new(32).level(), ReliabilityLevel::Reliable);
        assert_eq!(Score::new(33).level(), ReliabilityLevel::Fuzzy);
        assert_eq!(Score::new(65).level(), ReliabilityLevel::Fuzzy);
        assert_eq!(Score::new(66).level(), ReliabilityLevel::Unreliable);
        assert_eq!(Score::new(100).level(), ReliabilityLevel::Unreliable);
    }

    #[test]
    fn display_formats() {
        assert_eq!(Score::new(42).to_string(), "42%");
        assert_eq!(ReliabilityLevel::Fuzzy.to_string(), "Fuzzy");
    }
}
