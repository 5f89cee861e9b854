//! Configuration Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. See `ERRORS.md` for design rationale.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Explicitly requested configuration file does not exist
    #[display("configuration file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Figment extraction failed (syntax error, type mismatch, missing field)
    #[display("invalid configuration: {_0}")]
    Invalid(figment::Error),
    /// A configured value fails semantic validation
    #[display("bad configuration value: {_0}")]
    Validation(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
