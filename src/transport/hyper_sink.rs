//! Hyper response sink
//!
//! Bridges the push-style sink to hyper's pull-style body: the head travels
//! over a oneshot channel, body frames over a bounded mpsc channel whose
//! receiver becomes the response body stream.
//!
//! A write stall limit bounds how long a single frame may wait for the peer
//! to make room; total transfer time is unbounded.

use super::ResponseSink;
use crate::error::SinkError;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::header::HeaderMap;
use hyper::{Response, StatusCode};
use std::io;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Body type of responses produced through [`HyperSink`]
pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;

type Head = (StatusCode, HeaderMap);
type BodyFrame = io::Result<Frame<Bytes>>;

/// Frames in flight between the transfer and the connection
const BODY_CHANNEL_CAPACITY: usize = 4;

/// Sink half, handed to the pipeline
#[derive(Debug)]
pub struct HyperSink {
    status: StatusCode,
    headers: HeaderMap,
    head_tx: Option<oneshot::Sender<Head>>,
    body_tx: Option<mpsc::Sender<BodyFrame>>,
    write_timeout: Option<Duration>,
}

/// Receiving half, turned into a `hyper::Response` once the head is ready
#[derive(Debug)]
pub struct PendingResponse {
    head_rx: oneshot::Receiver<Head>,
    body_rx: mpsc::Receiver<BodyFrame>,
}

impl HyperSink {
    pub fn channel() -> (Self, PendingResponse) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::channel(BODY_CHANNEL_CAPACITY);
        let sink = Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            head_tx: Some(head_tx),
            body_tx: Some(body_tx),
            write_timeout: None,
        };
        (sink, PendingResponse { head_rx, body_rx })
    }

    /// Fail a body frame that waits longer than `limit` for channel capacity
    #[must_use]
    pub fn with_write_timeout(mut self, limit: Duration) -> Self {
        self.write_timeout = Some(limit);
        self
    }

    async fn send_frame(&self, frame: BodyFrame) -> Result<(), SinkError> {
        let tx = self.body_tx.as_ref().ok_or(SinkError::Closed)?;
        let Some(limit) = self.write_timeout else {
            return tx.send(frame).await.map_err(|_| SinkError::Closed);
        };
        match tokio::time::timeout(limit, tx.send(frame)).await {
            Ok(sent) => sent.map_err(|_| SinkError::Closed),
            Err(_) => Err(SinkError::Stalled(limit)),
        }
    }

    fn flush_head(&mut self) {
        if let Some(tx) = self.head_tx.take() {
            // A dropped receiver means the request went away; body sends report it
            let _ = tx.send((self.status, self.headers.clone()));
        }
    }
}

#[async_trait]
impl ResponseSink for HyperSink {
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
        self.status = status;
    }

    fn headers_sent(&self) -> bool {
        self.head_tx.is_none()
    }

    async fn write(&mut self, chunk: Bytes) -> Result<(), SinkError> {
        self.flush_head();
        let sent = self.send_frame(Ok(Frame::data(chunk))).await;
        if sent.is_err() {
            // Dropping the sender ends the body stream short of Content-Length
            self.body_tx = None;
        }
        sent
    }

    async fn end(&mut self, body: Option<Bytes>) -> Result<(), SinkError> {
        self.flush_head();
        if self.body_tx.is_none() {
            return Err(SinkError::Closed);
        }
        let sent = match body.filter(|b| !b.is_empty()) {
            Some(body) => self.send_frame(Ok(Frame::data(body))).await,
            None => Ok(()),
        };
        self.body_tx = None;
        sent
    }

    async fn abort(&mut self, reason: io::Error) {
        self.flush_head();
        if let Some(tx) = self.body_tx.take() {
            let _ = tx.send(Err(reason)).await;
        }
    }

    async fn closed(&self) {
        if let Some(tx) = &self.body_tx {
            tx.closed().await;
        }
    }
}

impl PendingResponse {
    /// Wait for the head and build the streamed response
    pub async fn into_response(self) -> Result<Response<ResponseBody>, SinkError> {
        let (status, headers) = self.head_rx.await.map_err(|_| SinkError::Closed)?;

        let mut body_rx = self.body_rx;
        let frames = futures::stream::poll_fn(move |cx| body_rx.poll_recv(cx));
        let mut response = Response::new(StreamBody::new(frames).boxed_unsync());
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::CONTENT_TYPE;

    #[tokio::test]
    async fn test_head_flushed_on_first_write() {
        let (mut sink, pending) = HyperSink::channel();
        sink.set_status(StatusCode::PARTIAL_CONTENT);
        sink.set_header(CONTENT_TYPE, "text/plain".parse().unwrap());
        assert!(!sink.headers_sent());

        let writer = tokio::spawn(async move {
            sink.write(Bytes::from("ab")).await.unwrap();
            sink.end(Some(Bytes::from("cd"))).await.unwrap();
        });

        let response = pending.into_response().await.unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from("abcd"));
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_write_after_peer_gone() {
        let (mut sink, pending) = HyperSink::channel();
        drop(pending);
        assert!(matches!(
            sink.write(Bytes::from("x")).await,
            Err(SinkError::Closed)
        ));
        // resolves immediately once the receiver is gone
        sink.closed().await;
    }

    #[tokio::test]
    async fn test_abort_surfaces_body_error() {
        let (mut sink, pending) = HyperSink::channel();
        let writer = tokio::spawn(async move {
            sink.write(Bytes::from("partial")).await.unwrap();
            sink.abort(io::Error::other("disk gone")).await;
        });

        let response = pending.into_response().await.unwrap();
        assert!(response.into_body().collect().await.is_err());
        writer.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_reader_fails_write() {
        let (sink, pending) = HyperSink::channel();
        let mut sink = sink.with_write_timeout(Duration::from_secs(5));

        // nobody polls the body, so the channel fills up and the next frame stalls
        for _ in 0..BODY_CHANNEL_CAPACITY {
            sink.write(Bytes::from("x")).await.unwrap();
        }
        let err = sink.write(Bytes::from("x")).await.unwrap_err();
        assert!(matches!(err, SinkError::Stalled(limit) if limit == Duration::from_secs(5)));
        assert!(sink.write(Bytes::from("x")).await.is_err());
        drop(pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_reader_within_limit() {
        let (sink, pending) = HyperSink::channel();
        let mut sink = sink.with_write_timeout(Duration::from_secs(1));

        let writer = tokio::spawn(async move {
            for _ in 0..32 {
                sink.write(Bytes::from_static(&[7; 16])).await.unwrap();
            }
            sink.end(None).await.unwrap();
        });

        let response = pending.into_response().await.unwrap();
        let mut body = response.into_body();
        let mut received = 0;
        while let Some(frame) = body.frame().await {
            received += frame.unwrap().into_data().unwrap().len();
            // each frame trickles in well under the limit, the whole body well over it
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert_eq!(received, 32 * 16);
        writer.await.unwrap();
    }
}
