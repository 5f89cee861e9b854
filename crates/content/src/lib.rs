//! Markdown content parsing and fingerprinting.
//!
//! Turns one raw source file into a [`ContentUnit`]: slug derivation from
//! the filename, frontmatter resolution, Markdown→HTML conversion, and a
//! BLAKE3 fingerprint over the raw bytes for change detection. Parsing is
//! pure — the same bytes always produce the same unit.

pub mod error;
mod frontmatter;
pub mod markdown;
mod unit;

pub use crate::frontmatter::{DEFAULT_PAGE_TEMPLATE, Frontmatter};
pub use crate::unit::ContentUnit;

use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use rslug::slugify;
use std::path::Path;

/// Character budget for summaries derived from the body.
const SUMMARY_CHARS: usize = 200;

/// Parses one source file into a [`ContentUnit`].
///
/// `source` is the file's path relative to the content root (its stem
/// becomes the slug); `bytes` is the raw file content. Fails on invalid
/// UTF-8, empty sources, malformed frontmatter YAML, or a filename that
/// slugifies to nothing.
#[tracing::instrument(skip(bytes), fields(source = %source.as_ref().display()))]
pub fn parse_unit(source: impl AsRef<Path>, bytes: &[u8]) -> Result<ContentUnit> {
    let source = source.as_ref();
    let text = std::str::from_utf8(bytes).map_err(|_| ErrorKind::Encoding)?;
    if text.trim().is_empty() {
        exn::bail!(ErrorKind::Empty);
    }

    let slug = derive_slug(source)?;
    let (yaml, body) = frontmatter::split(text);
    let front = frontmatter::parse(yaml, &slug)?;
    let html = markdown::to_html(body);
    let summary = front.summary.clone().unwrap_or_else(|| markdown::summarize(body, SUMMARY_CHARS));

    Ok(ContentUnit {
        slug,
        source: source.to_path_buf(),
        fingerprint: blake3::hash(bytes).to_string(),
        front,
        html,
        summary,
        media: markdown::media_refs(body),
    })
}

/// Derives the slug a source file would get, from its stem alone.
///
/// Exposed separately so callers can identify a unit whose content failed
/// to parse: the slug depends only on the filename, never on the bytes.
pub fn derive_slug(source: &Path) -> Result<String> {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_raise(|| ErrorKind::Slug(source.display().to_string()))?;
    let slug = slugify!(stem);
    if slug.is_empty() {
        exn::bail!(ErrorKind::Slug(source.display().to_string()));
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SOURCE: &str = "---\ntitle: \"Hello World\"\ndate: 2024-06-15\ntags: [rust]\n---\n# Hello\n\nFirst post.\n";

    #[test]
    fn test_parse_complete_unit() {
        let unit = parse_unit("posts/Hello World.md", SOURCE.as_bytes()).unwrap();
        assert_eq!(unit.slug, "hello-world");
        assert_eq!(unit.front.title, "Hello World");
        assert_eq!(unit.output_path(), Path::new("hello-world.html"));
        assert!(unit.html.contains("<h1>Hello</h1>"));
        assert_eq!(unit.summary, "First post.");
    }

    #[test]
    fn test_fingerprint_is_over_raw_bytes() {
        let a = parse_unit("a.md", SOURCE.as_bytes()).unwrap();
        let b = parse_unit("b.md", SOURCE.as_bytes()).unwrap();
        // Same bytes, same fingerprint, regardless of filename.
        assert_eq!(a.fingerprint, b.fingerprint);

        let edited = SOURCE.replace("First post", "First post!");
        let c = parse_unit("a.md", edited.as_bytes()).unwrap();
        assert_ne!(a.fingerprint, c.fingerprint);
    }

    #[test]
    fn test_media_references_are_collected() {
        let unit = parse_unit("x.md", b"![cover](img/cover.png)\n\nbody text").unwrap();
        assert_eq!(unit.media, vec!["img/cover.png"]);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let a = parse_unit("posts/x.md", SOURCE.as_bytes()).unwrap();
        let b = parse_unit("posts/x.md", SOURCE.as_bytes()).unwrap();
        assert_eq!(a.html, b.html);
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.summary, b.summary);
    }

    #[rstest]
    #[case::empty(b"".as_slice())]
    #[case::whitespace(b"  \n\t\n".as_slice())]
    fn test_empty_source_rejected(#[case] bytes: &[u8]) {
        let err = parse_unit("x.md", bytes).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Empty));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let err = parse_unit("x.md", &[0xFF, 0xFE, 0x00]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Encoding));
    }

    #[test]
    fn test_unslugifiable_filename_rejected() {
        let err = parse_unit("posts/---.md", b"# Hi").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Slug(_)));
    }
}
