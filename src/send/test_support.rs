//! Stores that record or break stream lifecycles, for tests

use crate::error::StoreError;
use crate::store::{ByteStream, EntityMetadata, ResourceStore};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::SystemTime;

/// Counts its own drop
struct Tracked {
    inner: ByteStream,
    released: Arc<AtomicUsize>,
}

impl Stream for Tracked {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Wraps a store and counts opened and released streams
pub struct TrackedStore<S> {
    inner: S,
    stats: AtomicUsize,
    opened: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl<S> TrackedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            stats: AtomicUsize::new(0),
            opened: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn stats(&self) -> usize {
        self.stats.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: ResourceStore> ResourceStore for TrackedStore<S> {
    async fn stat(&self, path: &Path) -> Result<EntityMetadata, StoreError> {
        self.stats.fetch_add(1, Ordering::SeqCst);
        self.inner.stat(path).await
    }

    async fn open_range(
        &self,
        path: &Path,
        start: u64,
        end: u64,
    ) -> Result<ByteStream, StoreError> {
        let inner = self.inner.open_range(path, start, end).await?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::pin(Tracked {
            inner,
            released: Arc::clone(&self.released),
        }))
    }
}

/// Any path is an 8-byte file whose stream fails after `good_chunks` bytes
pub struct FailingStore {
    kind: io::ErrorKind,
    good_chunks: usize,
    released: Arc<AtomicUsize>,
}

impl FailingStore {
    pub fn new(kind: io::ErrorKind, good_chunks: usize) -> Self {
        Self {
            kind,
            good_chunks,
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceStore for FailingStore {
    async fn stat(&self, _path: &Path) -> Result<EntityMetadata, StoreError> {
        Ok(EntityMetadata {
            size: 8,
            modified: SystemTime::UNIX_EPOCH,
            is_dir: false,
        })
    }

    async fn open_range(
        &self,
        _path: &Path,
        _start: u64,
        _end: u64,
    ) -> Result<ByteStream, StoreError> {
        let mut items: Vec<io::Result<Bytes>> = (0..self.good_chunks)
            .map(|_| Ok(Bytes::from_static(b"x")))
            .collect();
        items.push(Err(io::Error::from(self.kind)));
        Ok(Box::pin(Tracked {
            inner: Box::pin(futures::stream::iter(items)),
            released: Arc::clone(&self.released),
        }))
    }
}
