//! Owns the score and the scan mode, and drives the auto-scan animation.

use std::fmt;

use tracing::{debug, info};

use crate::frame::{FrameRequest, FrameScheduler};
use crate::score::Score;

/// Midpoint of the auto-scan sweep.
pub const SCAN_CENTER: f64 = 50.0;
/// Amplitude of the auto-scan sweep, so the needle travels 10..=90.
pub const SCAN_AMPLITUDE: f64 = 40.0;
/// Milliseconds per radian of the scan sinusoid.
pub const SCAN_MS_PER_RADIAN: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    #[default]
    Manual,
    Auto,
}

impl ScanMode {
    pub fn is_auto(self) -> bool {
        matches!(self, ScanMode::Auto)
    }

    pub fn toggled(self) -> Self {
        match self {
            ScanMode::Manual => ScanMode::Auto,
            ScanMode::Auto => ScanMode::Manual,
        }
    }
}

/// What observers see after every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub score: Score,
    pub scan: ScanMode,
}

pub type Observer = Box<dyn FnMut(&Snapshot)>;

/// Score produced by the scan animation `elapsed_ms` after it started.
pub fn scan_score(elapsed_ms: f64) -> Score {
    Score::clamped(SCAN_CENTER + SCAN_AMPLITUDE * (elapsed_ms / SCAN_MS_PER_RADIAN).sin())
}

pub struct Controller {
    score: Score,
    scan: ScanMode,
    scan_started_at: Option<f64>,
    scan_frame: Option<FrameRequest>,
    frames: FrameScheduler,
    observers: Vec<Observer>,
}

impl Controller {
    pub fn new(score: Score) -> Self {
        Self {
            score,
            scan: ScanMode::Manual,
            scan_started_at: None,
            scan_frame: None,
            frames: FrameScheduler::new(),
            observers: Vec::new(),
        }
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn scan_mode(&self) -> ScanMode {
        self.scan
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            score: self.score,
            scan: self.scan,
        }
    }

    /// Registers a redraw callback. It is called once immediately with the current state.
    pub fn subscribe(&mut self, mut observer: Observer) {
        observer(&self.snapshot());
        self.observers.push(observer);
    }

    /// Manual input: clamps, leaves auto-scan and stores the value.
    pub fn set_value(&mut self, value: f64) {
        self.stop_scan();
        self.score = Score::clamped(value);
        debug!(score = %self.score, "value set");
        self.notify();
    }

    /// Relative manual adjustment, e.g. from arrow keys.
    pub fn nudge(&mut self, delta: i32) {
        self.set_value(f64::from(self.score.value()) + f64::from(delta));
    }

    pub fn toggle_scan(&mut self) {
        match self.scan {
            ScanMode::Manual => {
                self.scan = ScanMode::Auto;
                self.scan_started_at = None;
                let frame = self.frames.request();
                self.scan_frame = Some(frame);
                info!(frame = frame.id(), "auto-scan started");
            }
            ScanMode::Auto => {
                self.stop_scan();
            }
        }
        self.notify();
    }

    /// Advances the scan animation to `timestamp_ms`. Returns false in manual mode.
    ///
    /// The first tick after the scan starts pins the start time, so it always
    /// yields the sweep midpoint.
    pub fn tick(&mut self, timestamp_ms: f64) -> bool {
        if !self.scan.is_auto() {
            return false;
        }
        let started = *self.scan_started_at.get_or_insert(timestamp_ms);
        let elapsed = (timestamp_ms - started).max(0.0);
        self.score = scan_score(elapsed);
        self.scan_frame = Some(self.frames.request());
        self.notify();
        true
    }

    /// Hands the pending frame to the display loop, if there is one.
    pub fn take_frame(&mut self) -> Option<FrameRequest> {
        self.frames.take_due()
    }

    pub fn frame_pending(&self) -> bool {
        self.frames.is_pending()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.pending()
    }

    fn stop_scan(&mut self) {
        if !self.scan.is_auto() {
            return;
        }
        self.scan = ScanMode::Manual;
        self.scan_started_at = None;
        if let Some(frame) = self.scan_frame.take() {
            if self.frames.cancel(frame) {
                debug!(frame = frame.id(), "pending scan frame cancelled");
            }
        }
        info!(score = %self.score, "auto-scan stopped");
    }

    fn notify(&mut self) {
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer(&snapshot);
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(Score::default())
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("score", &self.score)
            .field("scan", &self.scan)
            .field("scan_started_at", &self.scan_started_at)
            .field("scan_frame", &self.scan_frame)
            .field("frames", &self.frames)
            .field("observers", &self.observers.len())
            .finish()
    }
}
