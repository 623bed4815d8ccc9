//! Filesystem-backed resource store

use super::{ByteStream, EntityMetadata, ResourceStore};
use crate::error::StoreError;
use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Read buffer size for file streams
const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Serves entities straight from the local filesystem via `tokio::fs`
#[derive(Debug, Clone, Copy)]
pub struct FsStore {
    chunk_size: usize,
}

impl Default for FsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FsStore {
    pub const fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Use a different read buffer size (minimum 1 byte)
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }
}

#[async_trait]
impl ResourceStore for FsStore {
    async fn stat(&self, path: &Path) -> Result<EntityMetadata, StoreError> {
        let meta = fs::metadata(path).await?;
        Ok(EntityMetadata {
            size: meta.len(),
            modified: meta.modified().unwrap_or(UNIX_EPOCH),
            is_dir: meta.is_dir(),
        })
    }

    async fn open_range(
        &self,
        path: &Path,
        start: u64,
        end: u64,
    ) -> Result<ByteStream, StoreError> {
        let mut file = File::open(path).await?;
        if start > 0 {
            file.seek(SeekFrom::Start(start)).await?;
        }
        let window = end.saturating_sub(start).saturating_add(1);
        let reader = file.take(window);
        Ok(Box::pin(ReaderStream::with_capacity(reader, self.chunk_size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    async fn collect(stream: ByteStream) -> Vec<u8> {
        stream
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_stat_file_and_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();

        let store = FsStore::new();
        let meta = store.stat(&dir.path().join("a.txt")).await.unwrap();
        assert_eq!(meta.size, 5);
        assert!(!meta.is_dir);

        let meta = store.stat(dir.path()).await.unwrap();
        assert!(meta.is_dir);
    }

    #[tokio::test]
    async fn test_stat_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new();

        let err = store.stat(&dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        std::fs::write(dir.path().join("file"), b"x").unwrap();
        let err = store.stat(&dir.path().join("file/child")).await.unwrap_err();
        assert!(err.is_missing());
    }

    #[tokio::test]
    async fn test_open_range_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digits.txt");
        std::fs::write(&path, b"0123456789").unwrap();

        let store = FsStore::with_chunk_size(3);
        assert_eq!(collect(store.open_range(&path, 2, 5).await.unwrap()).await, b"2345");
        assert_eq!(collect(store.open_range(&path, 0, 9).await.unwrap()).await, b"0123456789");
        // end past EOF just stops at EOF
        assert_eq!(collect(store.open_range(&path, 8, 20).await.unwrap()).await, b"89");
    }
}
