//! Framework error type.
//!
//! Sub-crates define their own error enums where they have their own failure
//! modes (`SimError`, `OutputError`) and wrap `HzError` as one variant.

use thiserror::Error;

use crate::ProfileId;

/// The top-level error type for `hz-core` and a common base for sub-crates.
///
/// Nothing inside a simulation tick produces one of these; they surface only
/// from configuration loading and builder validation.
#[derive(Debug, Error)]
pub enum HzError {
    #[error("profile {0} not found")]
    ProfileNotFound(ProfileId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `hz-*` crates.
pub type HzResult<T> = Result<T, HzError>;
