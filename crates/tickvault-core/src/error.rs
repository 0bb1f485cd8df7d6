use std::path::PathBuf;

use thiserror::Error;

/// Validation and contract errors exposed by `tickvault-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("instrument code cannot be empty")]
    EmptyCode,
    #[error("instrument code length {len} exceeds max {max}")]
    CodeTooLong { len: usize, max: usize },
    #[error("instrument code contains invalid character '{ch}' at index {index}")]
    CodeInvalidChar { ch: char, index: usize },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("bar high must be >= low")]
    InvalidBarRange,
}

/// Errors raised by the durable snapshot/holiday state on disk.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write state to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}
