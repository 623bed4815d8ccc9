//! Streaming transfer engine
//!
//! Relays a bounded byte stream from the store to the sink. The stream handle
//! is owned by a [`StreamGuard`] and released exactly once, on completion,
//! error, client disconnect or drop, whichever comes first.

use super::hooks::Hooks;
use super::planner::TransferWindow;
use crate::error::{SendError, StoreError};
use crate::logger;
use crate::store::{ByteStream, ResourceStore};
use crate::transport::ResponseSink;
use bytes::Bytes;
use futures::StreamExt;
use std::io;
use std::path::Path;

/// How a body transfer ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transferred {
    Complete(u64),
    /// Peer went away or the stream failed after the head was flushed
    Aborted(u64),
}

/// Owns an open byte stream until it is released
pub struct StreamGuard<'a> {
    stream: Option<ByteStream>,
    path: &'a Path,
    sent: u64,
}

impl<'a> StreamGuard<'a> {
    pub fn new(stream: ByteStream, path: &'a Path) -> Self {
        Self {
            stream: Some(stream),
            path,
            sent: 0,
        }
    }

    async fn next(&mut self) -> Option<io::Result<Bytes>> {
        match self.stream.as_mut() {
            Some(stream) => stream.next().await,
            None => None,
        }
    }

    pub const fn is_released(&self) -> bool {
        self.stream.is_none()
    }

    /// Drop the stream if still held; returns the bytes relayed
    pub fn release(&mut self) -> u64 {
        if self.stream.take().is_some() {
            logger::log_stream_released(self.path, self.sent);
        }
        self.sent
    }
}

impl Drop for StreamGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

enum Step {
    Closed,
    Next(Option<io::Result<Bytes>>),
}

/// Stream `window` of the entity at `path` into `sink` and end the response
pub async fn transfer<S, R>(
    store: &S,
    sink: &mut R,
    path: &Path,
    window: TransferWindow,
    hooks: &Hooks,
) -> Result<Transferred, SendError>
where
    S: ResourceStore + ?Sized,
    R: ResponseSink + ?Sized,
{
    if window.length == 0 {
        return finish(sink, 0, hooks).await;
    }

    let stream = store.open_range(path, window.offset, window.end()).await?;
    logger::log_stream_opened(path, window.offset, window.end());
    hooks.stream(path, window.offset, window.end());
    let mut guard = StreamGuard::new(stream, path);

    while guard.sent < window.length {
        let step = tokio::select! {
            biased;
            () = sink.closed() => Step::Closed,
            next = guard.next() => Step::Next(next),
        };

        match step {
            Step::Closed => {
                logger::log_stream_aborted(path, "client closed connection");
                return Ok(Transferred::Aborted(guard.release()));
            }
            Step::Next(Some(Ok(mut chunk))) => {
                let remaining = window.length - guard.sent;
                if chunk.len() as u64 > remaining {
                    chunk.truncate(usize::try_from(remaining).unwrap_or(usize::MAX));
                }
                let len = chunk.len() as u64;
                if sink.write(chunk).await.is_err() {
                    logger::log_stream_aborted(path, "client closed connection");
                    return Ok(Transferred::Aborted(guard.release()));
                }
                guard.sent += len;
            }
            Step::Next(Some(Err(err))) => {
                let sent = guard.release();
                return stream_failed(sink, path, err, sent).await;
            }
            Step::Next(None) => {
                let sent = guard.release();
                let err = io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "entity ended before the requested window",
                );
                return stream_failed(sink, path, err, sent).await;
            }
        }
    }

    let sent = guard.release();
    finish(sink, sent, hooks).await
}

async fn finish<R: ResponseSink + ?Sized>(
    sink: &mut R,
    sent: u64,
    hooks: &Hooks,
) -> Result<Transferred, SendError> {
    if sink.end(None).await.is_err() {
        return Ok(Transferred::Aborted(sent));
    }
    hooks.end(sent);
    Ok(Transferred::Complete(sent))
}

/// A stream error maps to an HTTP error only while nothing has been flushed
async fn stream_failed<R: ResponseSink + ?Sized>(
    sink: &mut R,
    path: &Path,
    err: io::Error,
    sent: u64,
) -> Result<Transferred, SendError> {
    if !sink.headers_sent() {
        return Err(StoreError::from(err).into());
    }
    logger::log_stream_aborted(path, &err.to_string());
    sink.abort(err).await;
    Ok(Transferred::Aborted(sent))
}
