//! In-memory storage backend for testing.

use super::FileInfoStream;
use crate::error::{ErrorKind, Result};
use crate::file::FileInfo;
use crate::path::validate as validate_path;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::StorageBackend;

/// In-memory storage backend for testing.
///
/// Files live in a `HashMap` behind a [`RwLock`], so all trait methods work
/// on `&self` without external synchronisation. Ideal for engine tests that
/// need content, template and output backends without touching a filesystem.
///
/// # Examples
///
/// ```
/// use plume_storage::backend::{MemoryBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MemoryBackend::with_files([
///     ("posts/hello.md", b"# Hello".as_slice()),
/// ]);
/// assert!(backend.exists(Path::new("posts/hello.md")).await?);
/// # Ok(())
/// # }
/// ```
pub struct MemoryBackend {
    name: String,
    storage: RwLock<HashMap<PathBuf, (OffsetDateTime, Vec<u8>)>>,
}

impl MemoryBackend {
    /// Create a memory backend pre-populated with files.
    ///
    /// Panics if any path fails validation. This backend exists for tests;
    /// broken test setup should not pass silently.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        let now = OffsetDateTime::now_utc();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MemoryBackend::with_files: invalid path {}", path.display());
            };
            map.insert(validated, (now, data.into()));
        }
        Self {
            name: "memory".to_string(),
            storage: RwLock::new(map),
        }
    }

    /// Change the name of the backend (shows up in logs).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
impl Default for MemoryBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };

        Box::pin(stream! {
            // Snapshot matching entries under the read lock, then drop it
            // before yielding to avoid holding the lock across yield points.
            let snapshot: Vec<FileInfo> = {
                let storage = self.storage.read().await;
                storage
                    .iter()
                    .filter(|(path, _)| validated_prefix.as_deref().is_none_or(|pfx| path.starts_with(pfx)))
                    .map(|(path, (modified, data))| FileInfo::new(path.clone(), data.len() as u64, *modified))
                    .collect()
            };
            for info in snapshot {
                yield Ok(info);
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let validated = validate_path(path)?;
        Ok(self.storage.read().await.contains_key(&validated))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let validated = validate_path(path)?;
        let storage = self.storage.read().await;
        match storage.get(&validated) {
            Some((_, data)) => Ok(data.clone()),
            None => exn::bail!(ErrorKind::NotFound(validated)),
        }
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let validated = validate_path(path)?;
        self.storage.write().await.insert(validated, (OffsetDateTime::now_utc(), data.to_vec()));
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let validated = validate_path(path)?;
        match self.storage.write().await.remove(&validated) {
            Some(_) => Ok(()),
            None => exn::bail!(ErrorKind::NotFound(validated)),
        }
    }
}
