use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use clap::Parser;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

use trust_gauge::{GaugeCommand, GaugeConfig, TrustGauge};

/// Trust indicator gauge with a scan animation and manual controls.
#[derive(Parser, Debug)]
#[command(name = "trust-gauge", version, about)]
struct Cli {
    /// Starting score, clamped to 0..=100
    #[arg(long, default_value_t = 25.0, allow_negative_numbers = true)]
    value: f64,

    /// Start with the sinusoidal scan running
    #[arg(long)]
    scan: bool,

    /// Window width in logical pixels
    #[arg(long, default_value_t = 560)]
    width: usize,

    /// Window height in logical pixels
    #[arg(long, default_value_t = 800)]
    height: usize,

    /// Upper bound on redraws per second
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// TrueType/OpenType font used for labels and the readout
    #[arg(long)]
    font: Option<PathBuf>,

    /// Window title prefix
    #[arg(long, default_value = "Trust Indicator")]
    title: String,

    /// Read commands from stdin, one per line: a value, `scan`, `+N` or `-N`
    #[arg(long)]
    pipe: bool,

    /// Keep the readout dot at full opacity
    #[arg(long)]
    no_pulse: bool,
}

impl Cli {
    fn config(&self) -> GaugeConfig {
        GaugeConfig::builder()
            .title(self.title.clone())
            .initial_value(self.value)
            .start_scanning(self.scan)
            .window_width(self.width)
            .window_height(self.height)
            .max_framerate(self.fps)
            .pulse_indicator(!self.no_pulse)
            .maybe_font_path(self.font.clone())
            .build()
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok();
}

fn spawn_stdin_reader() -> mpsc::Receiver<GaugeCommand> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(error = %err, "stdin closed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<GaugeCommand>() {
                Ok(command) => {
                    if sender.send(command).is_err() {
                        break;
                    }
                }
                Err(err) => warn!(%err, "skipping input line"),
            }
        }
        debug!("stdin reader finished");
    });
    receiver
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let gauge = TrustGauge::new(cli.config());

    let result = if cli.pipe {
        gauge.show_with_commands(spawn_stdin_reader())
    } else {
        gauge.show()
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "trust-gauge exited with an error");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_flow_into_config() {
        let cli = Cli::parse_from([
            "trust-gauge",
            "--value",
            "120",
            "--scan",
            "--fps",
            "30",
            "--font",
            "/tmp/font.ttf",
            "--no-pulse",
        ]);
        let config = cli.config();
        assert_eq!(config.initial_score().value(), 100);
        assert!(config.start_scanning);
        assert_eq!(config.max_framerate, 30.0);
        assert!(!config.pulse_indicator);
        assert_eq!(config.font_path, Some(PathBuf::from("/tmp/font.ttf")));
    }

    #[test]
    fn defaults_match_library_config() {
        let config = Cli::parse_from(["trust-gauge"]).config();
        let library = GaugeConfig::default();
        assert_eq!(config.title, library.title);
        assert_eq!(config.initial_value, library.initial_value);
        assert_eq!(config.window_width, library.window_width);
        assert_eq!(config.window_height, library.window_height);
        assert!(config.font_path.is_none());
    }

    #[test]
    fn negative_value_is_accepted() {
        let cli = Cli::parse_from(["trust-gauge", "--value", "-5"]);
        assert_eq!(cli.config().initial_score().value(), 0);
    }
}
