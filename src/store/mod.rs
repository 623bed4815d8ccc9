//! Resource store module
//!
//! The transfer pipeline never touches the filesystem directly. It asks a
//! [`ResourceStore`] for metadata and for bounded byte streams, which keeps the
//! pipeline testable and lets callers serve from memory or other backends.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::time::SystemTime;

/// Owned stream of entity bytes, consumed exactly once
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Snapshot of an entity's metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityMetadata {
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Directory rather than regular file
    pub is_dir: bool,
}

/// Read-only access to byte-addressable resources
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Look up metadata for a location
    async fn stat(&self, path: &Path) -> Result<EntityMetadata, StoreError>;

    /// Open a stream over the inclusive byte window `start..=end`
    async fn open_range(&self, path: &Path, start: u64, end: u64)
        -> Result<ByteStream, StoreError>;
}

#[async_trait]
impl<S: ResourceStore + ?Sized> ResourceStore for std::sync::Arc<S> {
    async fn stat(&self, path: &Path) -> Result<EntityMetadata, StoreError> {
        (**self).stat(path).await
    }

    async fn open_range(
        &self,
        path: &Path,
        start: u64,
        end: u64,
    ) -> Result<ByteStream, StoreError> {
        (**self).open_range(path, start, end).await
    }
}
