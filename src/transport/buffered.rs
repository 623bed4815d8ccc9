//! In-memory response sink

use super::ResponseSink;
use crate::error::SinkError;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use hyper::header::HeaderMap;
use hyper::StatusCode;
use std::io;

/// Collects a complete response in memory
///
/// `disconnect_after` simulates a peer that goes away after a number of body
/// writes, which is how transfer cancellation is exercised.
#[derive(Debug, Default)]
pub struct BufferedSink {
    status: StatusCode,
    headers: HeaderMap,
    sent_headers: Option<HeaderMap>,
    body: BytesMut,
    writes: usize,
    disconnect_after: Option<usize>,
    finished: bool,
    aborted: Option<String>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Peer disconnects once `writes` body chunks have been accepted
    pub fn disconnect_after(writes: usize) -> Self {
        Self {
            disconnect_after: Some(writes),
            ..Self::default()
        }
    }

    /// Headers as they were at flush time, or the current ones if not flushed
    pub fn sent_headers(&self) -> &HeaderMap {
        self.sent_headers.as_ref().unwrap_or(&self.headers)
    }

    pub fn body(&self) -> Bytes {
        self.body.clone().freeze()
    }

    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn abort_reason(&self) -> Option<&str> {
        self.aborted.as_deref()
    }

    const fn is_disconnected(&self) -> bool {
        match self.disconnect_after {
            Some(limit) => self.writes >= limit,
            None => false,
        }
    }

    fn flush_head(&mut self) {
        if self.sent_headers.is_none() {
            self.sent_headers = Some(self.headers.clone());
        }
    }
}

#[async_trait]
impl ResponseSink for BufferedSink {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn status(&self) -> StatusCode {
        self.status
    }

    fn set_status(&mut self, status: StatusCode) {
        if self.sent_headers.is_none() {
            self.status = status;
        }
    }

    fn headers_sent(&self) -> bool {
        self.sent_headers.is_some()
    }

    async fn write(&mut self, chunk: Bytes) -> Result<(), SinkError> {
        self.flush_head();
        if self.finished || self.aborted.is_some() || self.is_disconnected() {
            return Err(SinkError::Closed);
        }
        self.body.extend_from_slice(&chunk);
        self.writes += 1;
        Ok(())
    }

    async fn end(&mut self, body: Option<Bytes>) -> Result<(), SinkError> {
        self.flush_head();
        if self.finished || self.aborted.is_some() {
            return Err(SinkError::Closed);
        }
        if let Some(body) = body {
            self.body.extend_from_slice(&body);
        }
        self.finished = true;
        Ok(())
    }

    async fn abort(&mut self, reason: io::Error) {
        self.flush_head();
        self.aborted = Some(reason.to_string());
    }

    async fn closed(&self) {
        if !self.is_disconnected() && !self.finished {
            std::future::pending::<()>().await;
        }
    }
}
