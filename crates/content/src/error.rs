//! Content Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. See `ERRORS.md` for design rationale.

use derive_more::{Display, Error};

/// A content error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for content operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Source file is not valid UTF-8
    #[display("source is not valid UTF-8")]
    Encoding,
    /// Source file is empty or whitespace-only
    #[display("source is empty")]
    Empty,
    /// Frontmatter block present but not valid YAML
    #[display("malformed frontmatter: {_0}")]
    Frontmatter(serde_yaml::Error),
    /// Filename does not yield a usable slug
    #[display("cannot derive a slug from `{_0}`")]
    Slug(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
