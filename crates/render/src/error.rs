//! Render Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. See `ERRORS.md` for design rationale.

use derive_more::{Display, Error};

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Template source failed to compile
    #[display("template `{_0}` failed to compile")]
    Compile(#[error(not(source))] String),
    /// Template expansion failed at render time
    #[display("template `{_0}` failed to render")]
    Render(#[error(not(source))] String),
    /// A unit references a template that does not exist
    #[display("no template named `{_0}`")]
    UnknownTemplate(#[error(not(source))] String),
    /// Embedded default template missing from the binary
    #[display("embedded template `{_0}` not found")]
    AssetNotFound(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
