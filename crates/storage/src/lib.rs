pub mod backend;
pub mod error;
mod file;
mod path;

pub use crate::backend::{LocalBackend, StorageBackend};
pub use crate::file::FileInfo;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
