//! Where downloads land.
//!
//! The pipeline only ever needs three operations: create a file, open it again
//! for reading, and rename it into place. Backends implement [`Storage`] so the
//! pipeline can run against the real filesystem or entirely in memory.

mod fs;
mod memory;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncWrite};

/// Suffix carried by a download until it has been verified and committed.
pub const TEMP_SUFFIX: &str = ".tmp";

pub type FileWriter = Box<dyn AsyncWrite + Send + Unpin>;
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Create (or truncate) the file at `path`.
    async fn create(&self, path: &Path) -> Result<FileWriter, StorageError>;
    /// Open an existing file for reading.
    async fn open(&self, path: &Path) -> Result<FileReader, StorageError>;
    /// Move `from` to `to`, replacing anything already at `to`. Once this returns,
    /// `from` no longer resolves.
    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError>;
}

/// Path for the temp file: appends `.tmp` to the final path (e.g. `file.iso` → `file.iso.tmp`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut path = final_path.as_os_str().to_owned();
    path.push(TEMP_SUFFIX);
    PathBuf::from(path)
}
