use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to read the tail of the tick log.
#[derive(Error, Debug)]
pub enum TailError {
    #[error("failed to open tick log {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read tick log {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why a raw log line did not produce a tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected 3 comma-separated fields, found {0}")]
    FieldCount(usize),

    #[error("invalid timestamp {0:?}")]
    Timestamp(String),

    #[error("invalid tick value {0:?}")]
    Value(String),
}
