use std::path::PathBuf;

use thiserror::Error;

/// Fatal record store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("cannot encode timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a single store line was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("expected at least {needed} fields, got {actual}")]
    TooFewFields { needed: usize, actual: usize },
    #[error("invalid timestamp '{0}'")]
    Timestamp(String),
    #[error("invalid length '{0}'")]
    Length(String),
    #[error("invalid port '{0}'")]
    Port(String),
    #[error("unreadable line: {0}")]
    Unreadable(String),
}
