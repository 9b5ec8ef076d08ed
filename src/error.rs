//! Errors raised while bringing up or driving the gauge window.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GaugeError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create pixel surface: {0}")]
    Surface(#[from] pixels::Error),

    #[error("failed to read font {}: {source}", .path.display())]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a usable TrueType/OpenType font", .0.display())]
    InvalidFont(PathBuf),

    #[error("unrecognised command {0:?}; expected a number, `scan`, `+N` or `-N`")]
    InvalidCommand(String),
}
