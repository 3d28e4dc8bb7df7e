use std::io;
use std::path::PathBuf;

use market::error::TailError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to open stats file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write stats row: {0}")]
    Csv(#[from] csv::Error),

    #[error("stats sink i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Anything that aborts a single poll cycle.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error(transparent)]
    Source(#[from] TailError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}
