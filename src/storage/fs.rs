use super::{FileReader, FileWriter, Storage};
use crate::error::StorageError;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs::{self, File};

/// Storage backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

#[async_trait]
impl Storage for FsStorage {
    async fn create(&self, path: &Path) -> Result<FileWriter, StorageError> {
        let create_err = |source| StorageError::Create { path: path.to_path_buf(), source };
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(create_err)?;
        }
        let file = File::create(path).await.map_err(create_err)?;
        Ok(Box::new(file))
    }
    async fn open(&self, path: &Path) -> Result<FileReader, StorageError> {
        let file = File::open(path).await.map_err(|source| StorageError::Open { path: path.to_path_buf(), source })?;
        Ok(Box::new(file))
    }
    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        fs::rename(from, to).await.map_err(|source| StorageError::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })
    }
}
