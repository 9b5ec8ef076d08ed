// ============================================================================
// CRATE CONFIGURATION & IMPORTS
// ============================================================================

pub mod config;
pub mod controller;
pub mod easing;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod panel;
pub mod render;
pub mod scene;
pub mod score;

// External crate imports
use pixels::{Pixels, SurfaceTexture};
use rusttype::Font;
use tracing::{debug, info, warn};

// Standard library imports
use std::str::FromStr;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Instant;

// Window management imports
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

pub use config::{Color, GaugeConfig};
pub use controller::{Controller, ScanMode, Snapshot};
pub use error::GaugeError;
pub use score::{ReliabilityLevel, Score};

use easing::{pulse_opacity, NeedleTransition};
use geometry::needle_angle;
use panel::{key_action, ControlAction, Layout};
use render::{load_font, render_frame, FrameState};
use scene::Canvas;

// ============================================================================
// PUBLIC API - MAIN INTERFACE
// ============================================================================

/// Command enum for driving the gauge from another thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GaugeCommand {
    SetValue(f64),
    ToggleScan,
    Nudge(i32),
}

impl FromStr for GaugeCommand {
    type Err = GaugeError;

    /// Accepts a plain number, `scan`, or a signed step such as `+5` / `-3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        if line.eq_ignore_ascii_case("scan") {
            return Ok(GaugeCommand::ToggleScan);
        }
        if let Some(step) = line.strip_prefix('+').or_else(|| line.strip_prefix('-')) {
            // The step itself must be unsigned: `--5` and `+-5` are rejected.
            if step.starts_with(|c: char| c.is_ascii_digit()) {
                if let Ok(delta) = step.parse::<i32>() {
                    let delta = if line.starts_with('-') { -delta } else { delta };
                    return Ok(GaugeCommand::Nudge(delta));
                }
            }
        }
        line.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(GaugeCommand::SetValue)
            .ok_or_else(|| GaugeError::InvalidCommand(line.to_string()))
    }
}

/// Window title for the current reading, e.g. `Trust Indicator – 42% Fuzzy`.
fn window_title(base: &str, snapshot: &Snapshot) -> String {
    format!("{base} – {} {}", snapshot.score, snapshot.score.level())
}

/// Main gauge struct - the primary public interface
#[derive(Debug, Clone)]
pub struct TrustGauge {
    config: GaugeConfig,
}

impl TrustGauge {
    pub fn new(config: GaugeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GaugeConfig {
        &self.config
    }

    pub fn show(self) -> Result<(), GaugeError> {
        self.run_window(None)
    }

    pub fn show_with_commands(self, receiver: Receiver<GaugeCommand>) -> Result<(), GaugeError> {
        self.run_window(Some(receiver))
    }

    fn run_window(self, receiver: Option<Receiver<GaugeCommand>>) -> Result<(), GaugeError> {
        let font = load_font(self.config.font_path.as_deref())?;

        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(
                self.config.window_width as f64,
                self.config.window_height as f64,
            ))
            .with_min_inner_size(LogicalSize::new(280.0, 400.0))
            .build(&event_loop)?;
        let window = Arc::new(window);

        let mut app_state = AppState::new(&self.config, receiver);
        let title_window = Arc::clone(&window);
        let base_title = self.config.title.clone();
        let mut last_score = None;
        app_state.controller.subscribe(Box::new(move |snapshot: &Snapshot| {
            if last_score != Some(snapshot.score) {
                last_score = Some(snapshot.score);
                title_window.set_title(&window_title(&base_title, snapshot));
            }
        }));

        let size = window.inner_size();
        let mut fb_width = size.width as usize;
        let mut fb_height = size.height as usize;
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        let mut pixels = Pixels::new(size.width, size.height, surface_texture)?;

        let frame_duration = self.config.frame_duration();
        let mut last_frame = Instant::now();
        let window_clone = Arc::clone(&window);
        let config = self.config;

        info!(
            width = fb_width,
            height = fb_height,
            fps = config.max_framerate,
            "gauge window opened"
        );

        let app = &mut app_state;
        event_loop.run(move |event, window_target| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if new_size.width == 0 || new_size.height == 0 {
                        return;
                    }
                    fb_width = new_size.width as usize;
                    fb_height = new_size.height as usize;
                    // Non-fatal: a failed resize keeps presenting at the previous size.
                    if let Err(err) = pixels.resize_buffer(new_size.width, new_size.height) {
                        warn!(error = %err, "failed to resize pixel buffer");
                    }
                    if let Err(err) = pixels.resize_surface(new_size.width, new_size.height) {
                        warn!(error = %err, "failed to resize surface");
                    }
                    window_clone.request_redraw();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let layout = Layout::new(fb_width, fb_height);
                    if app.pointer_moved(&layout, position.x, position.y) {
                        window_clone.request_redraw();
                    }
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => {
                    let layout = Layout::new(fb_width, fb_height);
                    match state {
                        ElementState::Pressed => app.pointer_pressed(&layout),
                        ElementState::Released => app.pointer_released(),
                    }
                    window_clone.request_redraw();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state != ElementState::Pressed {
                        return;
                    }
                    if let Some(action) = key_action(&event.logical_key) {
                        if action == ControlAction::Quit {
                            window_target.exit();
                            return;
                        }
                        app.apply_action(action);
                        window_clone.request_redraw();
                    }
                }
                WindowEvent::RedrawRequested => {
                    app.update();

                    let frame = pixels.frame_mut();
                    let mut canvas = Canvas::new(frame, fb_width, fb_height);
                    app.render(&mut canvas, &config, font.as_ref());
                    if let Err(err) = pixels.render() {
                        app.fail(GaugeError::Surface(err));
                        window_target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                if !app.wants_frames() {
                    window_target.set_control_flow(ControlFlow::Wait);
                    return;
                }
                let next_frame = last_frame + frame_duration;
                if Instant::now() >= next_frame {
                    window_clone.request_redraw();
                    last_frame = Instant::now();
                    window_target.set_control_flow(ControlFlow::WaitUntil(last_frame + frame_duration));
                } else {
                    window_target.set_control_flow(ControlFlow::WaitUntil(next_frame));
                }
            }
            _ => {}
        })?;

        app_state.finish()
    }
}

// ============================================================================
// WINDOW STATE (INTERNAL)
// ============================================================================

struct AppState {
    controller: Controller,
    needle: NeedleTransition,
    epoch: Instant,
    cursor: Option<(f64, f64)>,
    dragging: bool,
    pulse_period_ms: Option<f64>,
    commands: Option<Receiver<GaugeCommand>>,
    fatal: Option<GaugeError>,
}

impl AppState {
    fn new(config: &GaugeConfig, commands: Option<Receiver<GaugeCommand>>) -> Self {
        let score = config.initial_score();
        let mut controller = Controller::new(score);
        if config.start_scanning {
            controller.toggle_scan();
        }
        Self {
            controller,
            needle: NeedleTransition::new(needle_angle(score), config.needle_transition_ms),
            epoch: Instant::now(),
            cursor: None,
            dragging: false,
            pulse_period_ms: config.pulse_indicator.then_some(config.pulse_period_ms),
            commands,
            fatal: None,
        }
    }

    /// Milliseconds since the window opened; the clock the animations run on.
    fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    fn apply(&mut self, command: GaugeCommand) {
        debug!(?command, "command received");
        match command {
            GaugeCommand::SetValue(value) => self.controller.set_value(value),
            GaugeCommand::ToggleScan => self.controller.toggle_scan(),
            GaugeCommand::Nudge(delta) => self.controller.nudge(delta),
        }
    }

    fn apply_action(&mut self, action: ControlAction) {
        match action {
            ControlAction::ToggleScan => self.controller.toggle_scan(),
            ControlAction::Preset(value) => self.controller.set_value(f64::from(value)),
            ControlAction::Slide(value) => self.controller.set_value(value),
            ControlAction::Nudge(delta) => self.controller.nudge(delta),
            ControlAction::Quit => {}
        }
    }

    fn pointer_pressed(&mut self, layout: &Layout) {
        let Some((x, y)) = self.cursor else {
            return;
        };
        if let Some(action) = layout.hit_test(x, y) {
            self.dragging = matches!(action, ControlAction::Slide(_));
            self.apply_action(action);
        }
    }

    /// Returns whether the move changed anything worth repainting.
    fn pointer_moved(&mut self, layout: &Layout, x: f64, y: f64) -> bool {
        self.cursor = Some((x, y));
        if !self.dragging {
            return false;
        }
        let value = layout.slider_value(x);
        if f64::from(self.controller.score().value()) == value {
            return false;
        }
        self.controller.set_value(value);
        true
    }

    fn pointer_released(&mut self) {
        self.dragging = false;
    }

    fn update(&mut self) {
        self.drain_commands();
        let now = self.now_ms();
        if let Some(frame) = self.controller.take_frame() {
            debug!(frame = frame.id(), "scan frame");
            self.controller.tick(now);
        }
        self.needle.retarget(needle_angle(self.controller.score()), now);
        self.needle.settle(now);
    }

    /// Applies queued commands; a closed channel stops the listening.
    fn drain_commands(&mut self) {
        loop {
            let next = match &self.commands {
                Some(receiver) => receiver.try_recv(),
                None => return,
            };
            match next {
                Ok(command) => self.apply(command),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    info!("command channel closed");
                    self.commands = None;
                    return;
                }
            }
        }
    }

    /// Whether the loop should keep repainting on its own.
    fn wants_frames(&self) -> bool {
        self.commands.is_some()
            || self.pulse_period_ms.is_some()
            || self.controller.frame_pending()
            || self.needle.is_animating(self.now_ms())
            || self.needle.target() != needle_angle(self.controller.score())
    }

    /// Records an error that ends the event loop. The first one wins.
    fn fail(&mut self, err: GaugeError) {
        warn!(error = %err, "stopping event loop");
        self.fatal.get_or_insert(err);
    }

    fn finish(self) -> Result<(), GaugeError> {
        self.fatal.map_or(Ok(()), Err)
    }

    fn render(&self, canvas: &mut Canvas, config: &GaugeConfig, font: Option<&Font<'static>>) {
        let now = self.now_ms();
        let state = FrameState {
            score: self.controller.score(),
            scan: self.controller.scan_mode(),
            needle_angle: self.needle.angle_at(now),
            pulse: self
                .pulse_period_ms
                .map_or(1.0, |period| pulse_opacity(now, period)),
            dragging: self.dragging,
            subtitle: &config.subtitle,
        };
        render_frame(canvas, &state, config, font);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn app() -> AppState {
        AppState::new(&GaugeConfig::builder().pulse_indicator(false).build(), None)
    }

    fn listening_app() -> (mpsc::Sender<GaugeCommand>, AppState) {
        let (sender, receiver) = mpsc::channel();
        let config = GaugeConfig::builder()
            .pulse_indicator(false)
            .needle_transition_ms(0.0)
            .build();
        (sender, AppState::new(&config, Some(receiver)))
    }

    #[test]
    fn parses_pipe_commands() {
        assert_eq!("42".parse::<GaugeCommand>().unwrap(), GaugeCommand::SetValue(42.0));
        assert_eq!(" 7.5 \n".parse::<GaugeCommand>().unwrap(), GaugeCommand::SetValue(7.5));
        assert_eq!("scan".parse::<GaugeCommand>().unwrap(), GaugeCommand::ToggleScan);
        assert_eq!("SCAN".parse::<GaugeCommand>().unwrap(), GaugeCommand::ToggleScan);
        assert_eq!("+5".parse::<GaugeCommand>().unwrap(), GaugeCommand::Nudge(5));
        assert_eq!("-3".parse::<GaugeCommand>().unwrap(), GaugeCommand::Nudge(-3));
        assert_eq!("-3.5".parse::<GaugeCommand>().unwrap(), GaugeCommand::SetValue(-3.5));
        assert!(matches!(
            "fast".parse::<GaugeCommand>(),
            Err(GaugeError::InvalidCommand(_))
        ));
        assert!("NaN".parse::<GaugeCommand>().is_err());
        assert!("-".parse::<GaugeCommand>().is_err());
    }

    #[test]
    fn nudge_step_takes_a_single_sign() {
        for line in ["--5", "+-5", "-+5", "++5", "+ 5"] {
            assert!(
                matches!(line.parse::<GaugeCommand>(), Err(GaugeError::InvalidCommand(_))),
                "{line:?} should be rejected"
            );
        }
    }

    #[test]
    fn title_shows_score_and_level() {
        let snapshot = Snapshot {
            score: Score::new(42),
            scan: ScanMode::Manual,
        };
        assert_eq!(
            window_title("Trust Indicator", &snapshot),
            "Trust Indicator – 42% Fuzzy"
        );
        let snapshot = Snapshot {
            score: Score::new(0),
            scan: ScanMode::Auto,
        };
        assert_eq!(window_title("Gauge", &snapshot), "Gauge – 0% Reliable");
    }

    #[test]
    fn commands_drive_the_controller() {
        let (sender, mut app) = listening_app();
        sender.send(GaugeCommand::SetValue(80.0)).unwrap();
        sender.send(GaugeCommand::Nudge(-5)).unwrap();
        app.update();
        assert_eq!(app.controller.score().value(), 75);
        assert_eq!(app.needle.target(), needle_angle(Score::new(75)));
    }

    #[test]
    fn scan_frames_are_consumed_by_update() {
        let mut app = app();
        app.apply(GaugeCommand::ToggleScan);
        assert!(app.controller.frame_pending());
        app.update();
        assert_eq!(app.controller.score().value(), 50);
        assert_eq!(app.controller.pending_frames(), 1);
        app.apply(GaugeCommand::ToggleScan);
        assert_eq!(app.controller.pending_frames(), 0);
    }

    #[test]
    fn slider_drag_sets_values_until_release() {
        let layout = Layout::new(560, 800);
        let mut app = app();
        let track = layout.slider_track;
        let (_, y) = track.center();

        app.pointer_moved(&layout, track.x + track.w * 0.2, y);
        app.pointer_pressed(&layout);
        assert!(app.dragging);
        assert_eq!(app.controller.score().value(), 20);

        assert!(app.pointer_moved(&layout, track.x + track.w * 0.6, y + 200.0));
        assert_eq!(app.controller.score().value(), 60);

        app.pointer_released();
        assert!(!app.pointer_moved(&layout, track.x, y));
        assert_eq!(app.controller.score().value(), 60);
    }

    #[test]
    fn preset_click_stops_scan() {
        let layout = Layout::new(560, 800);
        let mut app = app();
        app.apply(GaugeCommand::ToggleScan);
        let (value, rect) = layout.presets[2];
        let (x, y) = rect.center();
        app.pointer_moved(&layout, x, y);
        app.pointer_pressed(&layout);
        assert!(!app.dragging);
        assert_eq!(app.controller.score().value(), value);
        assert_eq!(app.controller.scan_mode(), ScanMode::Manual);
    }

    #[test]
    fn idle_gauge_stops_requesting_frames() {
        let app = app();
        assert!(!app.wants_frames());
    }

    #[test]
    fn closed_command_channel_stops_listening() {
        let (sender, mut app) = listening_app();
        app.update();
        assert!(app.wants_frames());

        sender.send(GaugeCommand::SetValue(30.0)).unwrap();
        drop(sender);
        app.update();
        assert_eq!(app.controller.score().value(), 30);
        assert!(app.commands.is_none());
        assert!(!app.wants_frames());
    }

    #[test]
    fn present_failure_is_reported_after_the_loop() {
        assert!(app().finish().is_ok());

        let mut failing = app();
        failing.fail(GaugeError::Surface(pixels::Error::AdapterNotFound));
        failing.fail(GaugeError::InvalidCommand("late".to_string()));
        assert!(matches!(failing.finish(), Err(GaugeError::Surface(_))));
    }
}
