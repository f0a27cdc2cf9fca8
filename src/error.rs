//! Error types
//!
//! Gameplay rule violations are not errors (see [`crate::sim::Rejection`]).
//! These cover the conditions a host actually has to handle.

use thiserror::Error;

/// Failure reading or writing a save blob
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("malformed save data: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid save data: {0}")]
    Invalid(String),

    #[error("unsupported save version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend error: {0}")]
    Storage(String),
}

/// Failure loading or validating a tuning file
#[derive(Error, Debug)]
pub enum TuningError {
    #[error("tuning parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid tuning: {0}")]
    Invalid(String),
}
