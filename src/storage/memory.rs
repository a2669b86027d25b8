use super::{FileReader, FileWriter, Storage};
use crate::error::StorageError;
use async_trait::async_trait;
use std::{
    collections::HashMap,
    io::{self, Cursor},
    path::{Component, Path, PathBuf},
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
};
use tokio::io::AsyncWrite;

type Contents = Arc<Mutex<Vec<u8>>>;

/// In-memory storage for tests. Clones share the same set of files.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<HashMap<PathBuf, Contents>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
    /// Current bytes of the file at `path`, if it exists.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files()
            .get(&normalize(path.as_ref()))
            .map(|contents| lock(contents).clone())
    }
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.files().contains_key(&normalize(path.as_ref()))
    }
    /// Paths of every stored file, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths = self.files().keys().cloned().collect::<Vec<_>>();
        paths.sort();
        paths
    }
    fn files(&self) -> MutexGuard<'_, HashMap<PathBuf, Contents>> {
        lock(&self.files)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create(&self, path: &Path) -> Result<FileWriter, StorageError> {
        let contents = Contents::default();
        self.files().insert(normalize(path), contents.clone());
        Ok(Box::new(MemoryFile { contents }))
    }
    async fn open(&self, path: &Path) -> Result<FileReader, StorageError> {
        let data = self.contents(path).ok_or_else(|| StorageError::Open {
            path: path.to_path_buf(),
            source: io::ErrorKind::NotFound.into(),
        })?;
        Ok(Box::new(Cursor::new(data)))
    }
    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        let mut files = self.files();
        let contents = files.remove(&normalize(from)).ok_or_else(|| StorageError::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: io::ErrorKind::NotFound.into(),
        })?;
        files.insert(normalize(to), contents);
        Ok(())
    }
}

struct MemoryFile {
    contents: Contents,
}

impl AsyncWrite for MemoryFile {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        lock(&self.contents).extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }
    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// `./name` and `name` refer to the same file.
fn normalize(path: &Path) -> PathBuf {
    path.components().filter(|component| !matches!(component, Component::CurDir)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn rename_moves_contents() {
        let storage = MemoryStorage::new();
        let mut writer = storage.create(Path::new("./file.tmp")).await.unwrap();
        writer.write_all(b"abc").await.unwrap();
        writer.write_all(b"def").await.unwrap();

        storage.rename(Path::new("./file.tmp"), Path::new("./file")).await.unwrap();
        assert!(!storage.exists("file.tmp"));
        assert_eq!(storage.contents("file").as_deref(), Some(&b"abcdef"[..]));

        let mut read = Vec::new();
        storage.open(Path::new("file")).await.unwrap().read_to_end(&mut read).await.unwrap();
        assert_eq!(read, b"abcdef");
    }

    #[tokio::test]
    async fn rename_replaces_existing_target() {
        let storage = MemoryStorage::new();
        storage.create(Path::new("out")).await.unwrap().write_all(b"old").await.unwrap();
        storage.create(Path::new("out.tmp")).await.unwrap().write_all(b"new").await.unwrap();

        storage.rename(Path::new("out.tmp"), Path::new("out")).await.unwrap();
        assert_eq!(storage.paths(), vec![PathBuf::from("out")]);
        assert_eq!(storage.contents("out").unwrap(), b"new");
    }

    #[tokio::test]
    async fn missing_files_are_errors() {
        let storage = MemoryStorage::new();
        assert!(matches!(storage.open(Path::new("nope")).await, Err(StorageError::Open { .. })));
        assert!(matches!(
            storage.rename(Path::new("nope"), Path::new("other")).await,
            Err(StorageError::Rename { .. })
        ));
    }
}
