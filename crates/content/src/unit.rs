//! The content unit model.

use crate::frontmatter::Frontmatter;
use std::path::PathBuf;

/// One article: the unit of incremental rebuild.
///
/// Produced by [`parse_unit`](crate::parse_unit) from a single Markdown
/// source file. The `fingerprint` is a BLAKE3 digest over the raw source
/// bytes, so any byte-level edit — frontmatter or body — changes it.
#[derive(Debug, Clone)]
pub struct ContentUnit {
    /// Unique identifier, derived from the source filename.
    pub slug: String,
    /// Path of the source file relative to the content root.
    pub source: PathBuf,
    /// BLAKE3 digest over the raw source bytes.
    pub fingerprint: String,
    /// Resolved frontmatter.
    pub front: Frontmatter,
    /// Body converted to an HTML fragment.
    pub html: String,
    /// Plain-text summary (frontmatter value or derived from the body).
    pub summary: String,
    /// URLs of media assets the body references.
    pub media: Vec<String>,
}

impl ContentUnit {
    /// Relative path of this unit's rendered artifact in the output root.
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.html", self.slug))
    }
}
