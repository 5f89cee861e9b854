//! Path validation for storage-relative paths.
//!
//! Every path handed to a [`StorageBackend`](crate::StorageBackend) is
//! relative to that backend's root. Validation guarantees a path can never
//! escape the root, whether it names a Markdown source, a template, or a
//! rendered output artifact.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a storage-relative path.
///
/// Resolves `.` and `..` components without touching the filesystem and
/// rejects anything that would climb above the storage root. Null bytes are
/// rejected explicitly: they pass through `Path::components()` on Unix but
/// truncate in C-based syscalls.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use plume_storage::validate_path;
/// // Valid paths
/// assert!(validate_path("posts/hello-world.md").is_ok());
/// assert!(validate_path("blog/2024/entry.html").is_ok());
/// assert!(validate_path("posts/../sitemap.xml").is_ok()); // (never leaves the root)
/// // Invalid paths
/// assert!(validate_path("../secrets.toml").is_err());
/// assert!(validate_path("a/../../b").is_err()); // (leaves the root)
/// assert!(validate_path("a\0b").is_err());
/// // Paths get resolved
/// assert_eq!(
///     validate_path("posts/.././posts//./hello.md").unwrap(),
///     Path::new("posts/hello.md")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    // Rust's component parser handles the platform weirdness (non-UTF8,
    // backslash separators on Windows) so we don't have to.
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}
