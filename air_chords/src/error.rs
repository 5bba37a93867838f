//! Application-level errors.

use std::path::PathBuf;

use thiserror::Error;

use chord_gesture::SessionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    ParseConfig {
        path:   PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("rendering configuration: {0}")]
    RenderConfig(#[from] toml::ser::Error),

    #[error("window: {0}")]
    Window(String),

    #[error("replay {}: {reason}", path.display())]
    Replay { path: PathBuf, reason: String },

    #[error("starting async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("gesture thread panicked")]
    WorkerPanicked,

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AppError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io { path: path.into(), source }
    }
}
