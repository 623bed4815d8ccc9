//! Transport boundary
//!
//! The pipeline reads requests through a [`RequestView`] and writes responses
//! through a [`ResponseSink`]. Two sinks ship with the crate: [`HyperSink`] for
//! serving over hyper, and [`BufferedSink`] which keeps the whole response in
//! memory.

mod buffered;
mod hyper_sink;

pub use buffered::BufferedSink;
pub use hyper_sink::{HyperSink, PendingResponse, ResponseBody};

use crate::error::SinkError;
use async_trait::async_trait;
use bytes::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::{Method, Request, StatusCode};
use std::io;

/// Read-only view of the parts of a request the pipeline consults
#[derive(Debug, Clone, Copy)]
pub struct RequestView<'a> {
    pub method: &'a Method,
    pub headers: &'a HeaderMap,
}

impl<'a> RequestView<'a> {
    pub const fn new(method: &'a Method, headers: &'a HeaderMap) -> Self {
        Self { method, headers }
    }

    pub fn is_head(&self) -> bool {
        *self.method == Method::HEAD
    }

    /// Header value as a string, non-ASCII values treated as absent
    pub fn header(&self, name: &HeaderName) -> Option<&'a str> {
        crate::http::cache::header_str(self.headers, name)
    }
}

impl<'a, B> From<&'a Request<B>> for RequestView<'a> {
    fn from(req: &'a Request<B>) -> Self {
        Self::new(req.method(), req.headers())
    }
}

/// Where a response goes
///
/// Status and headers are buffered until the first body write or `end`, at
/// which point they are flushed and `headers_sent` turns true.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn status(&self) -> StatusCode;

    fn set_status(&mut self, status: StatusCode);

    fn headers_sent(&self) -> bool;

    /// Send a body chunk, flushing the head first if needed
    async fn write(&mut self, chunk: Bytes) -> Result<(), SinkError>;

    /// Finish the response, optionally with a final body
    async fn end(&mut self, body: Option<Bytes>) -> Result<(), SinkError>;

    /// Terminate the response abnormally
    async fn abort(&mut self, reason: io::Error);

    /// Resolves once the peer can no longer receive the response
    async fn closed(&self);

    fn header(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.headers().get(name)
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers_mut().insert(name, value);
    }

    fn remove_header(&mut self, name: &HeaderName) {
        self.headers_mut().remove(name);
    }

    fn header_names(&self) -> Vec<HeaderName> {
        self.headers().keys().cloned().collect()
    }
}
