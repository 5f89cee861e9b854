//! Build Engine Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. See `ERRORS.md` for design rationale.
//!
//! Only *fatal* build conditions surface here. Per-unit and per-aggregate
//! failures are collected into the [`BuildReport`](crate::BuildReport)
//! instead, so one broken article never aborts the rest of a build.

use derive_more::{Display, Error};

/// A build engine error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for build engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Content directory could not be enumerated
    #[display("failed to scan content directory")]
    Scan,
    /// Template directory could not be read, or the set failed to compile
    #[display("failed to load templates")]
    Templates,
    /// Build state could not be persisted
    #[display("failed to persist build state")]
    State,
    /// Storage backend failure outside any single unit
    #[display("storage backend failure")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage | Self::State)
    }
}
