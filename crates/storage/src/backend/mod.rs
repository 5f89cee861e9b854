//! Storage backend trait and implementations.
//!
//! The build engine reads Markdown sources and templates through a
//! [`StorageBackend`] and writes rendered artifacts plus the persisted build
//! state through another. Keeping the boundary behind a trait keeps the
//! engine free of ambient filesystem access and lets tests run against an
//! in-memory backend.

mod local;
#[cfg(feature = "mock")]
mod memory;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::memory::MemoryBackend;
use crate::error::Result;
use crate::file::FileInfo;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Unified interface over a directory tree of small text artifacts.
///
/// All operations are asynchronous. Paths are relative to the backend root
/// and must survive [`validate_path`](crate::validate_path); implementations
/// enforce this before touching anything.
///
/// The trait is deliberately whole-file: build inputs and outputs are
/// kilobyte-scale Markdown and HTML documents, so streaming reads and writes
/// would be complexity without payoff.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use plume_storage::{StorageBackend, error::Result};
///
/// async fn source_bytes(backend: &dyn StorageBackend) -> Result<Option<Vec<u8>>> {
///     let path = Path::new("posts/hello-world.md");
///     if backend.exists(path).await? {
///         Ok(Some(backend.read(path).await?))
///     } else {
///         Ok(None)
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// List all files matching an optional prefix.
    ///
    /// Default implementation collects [`list_stream()`](Self::list_stream)
    /// into a [`Vec`] before returning.
    async fn list(&self, prefix: Option<&Path>) -> Result<Vec<FileInfo>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Stream file metadata matching an optional prefix.
    ///
    /// Yields results incrementally. Listing a prefix that does not exist
    /// produces an empty stream, not an error.
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a>;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read complete file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents, creating parent directories as needed.
    ///
    /// Overwrites an existing file at the same path.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, path: &Path) -> Result<()>;
}
