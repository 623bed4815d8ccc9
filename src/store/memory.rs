//! In-memory resource store
//!
//! Useful for embedded assets and for exercising the pipeline without touching
//! the disk. Directories are implied by the files inserted below them.

use super::{ByteStream, EntityMetadata, ResourceStore};
use crate::error::StoreError;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone)]
enum Entry {
    File { content: Bytes, modified: SystemTime },
    Dir { modified: SystemTime },
}

/// Map of absolute locations to file contents
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<PathBuf, Entry>,
    chunk_size: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split streamed content into chunks of at most `chunk_size` bytes
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size.max(1));
        self
    }

    /// Insert a file, creating its parent directories
    pub fn insert_file(
        &mut self,
        path: impl Into<PathBuf>,
        content: impl Into<Bytes>,
        modified: SystemTime,
    ) {
        let path = path.into();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.entries
                .entry(ancestor.to_path_buf())
                .or_insert(Entry::Dir { modified });
        }
        self.entries.insert(
            path,
            Entry::File {
                content: content.into(),
                modified,
            },
        );
    }

    /// Insert an empty directory
    pub fn insert_dir(&mut self, path: impl Into<PathBuf>, modified: SystemTime) {
        self.entries.insert(path.into(), Entry::Dir { modified });
    }

    fn miss(&self, path: &Path) -> StoreError {
        let under_file = path
            .ancestors()
            .skip(1)
            .any(|a| matches!(self.entries.get(a), Some(Entry::File { .. })));
        if under_file {
            StoreError::NotDirectory
        } else {
            StoreError::NotFound
        }
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn stat(&self, path: &Path) -> Result<EntityMetadata, StoreError> {
        match self.entries.get(path) {
            Some(Entry::File { content, modified }) => Ok(EntityMetadata {
                size: content.len() as u64,
                modified: *modified,
                is_dir: false,
            }),
            Some(Entry::Dir { modified }) => Ok(EntityMetadata {
                size: 0,
                modified: *modified,
                is_dir: true,
            }),
            None => Err(self.miss(path)),
        }
    }

    async fn open_range(
        &self,
        path: &Path,
        start: u64,
        end: u64,
    ) -> Result<ByteStream, StoreError> {
        let content = match self.entries.get(path) {
            Some(Entry::File { content, .. }) => content,
            Some(Entry::Dir { .. }) => {
                return Err(StoreError::Io {
                    source: io::Error::other("is a directory"),
                })
            }
            None => return Err(self.miss(path)),
        };

        let len = content.len();
        let start = usize::try_from(start).unwrap_or(usize::MAX).min(len);
        let end = usize::try_from(end)
            .unwrap_or(usize::MAX)
            .saturating_add(1)
            .min(len)
            .max(start);
        let window = content.slice(start..end);

        let chunk_size = self.chunk_size.unwrap_or_else(|| window.len().max(1));
        let chunks: Vec<io::Result<Bytes>> = (0..window.len())
            .step_by(chunk_size)
            .map(|offset| Ok(window.slice(offset..(offset + chunk_size).min(window.len()))))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}
