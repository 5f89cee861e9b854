//! Storage file metadata.

use std::path::PathBuf;
use time::OffsetDateTime;

/// Metadata for a single file in a storage backend.
///
/// Returned by listing operations. Paths are always relative to the
/// backend root. The build engine never trusts `modified` for change
/// detection — fingerprints are computed over file contents — but the
/// timestamp is useful for reporting and for sitemap `lastmod` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative path from the storage root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: OffsetDateTime) -> Self {
        Self { path: path.into(), size, modified }
    }
}
