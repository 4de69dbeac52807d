//! Error types for the I/O edges. The engine itself never fails.

use thiserror::Error;

/// Errors from reading the YAML config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Errors from the newline-delimited sentiment feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("feed line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that stop the application before or while the window runs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to open window: {0}")]
    Window(#[from] minifb::Error),

    #[error("failed to install Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
