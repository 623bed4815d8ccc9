//! Error taxonomy
//!
//! Every terminal failure of the transfer pipeline is a [`SendError`], which knows
//! the HTTP status it renders as and any status-specific headers that must survive
//! the header reset done by the error responder.

use hyper::header::{HeaderMap, HeaderValue, CONTENT_RANGE};
use hyper::StatusCode;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single send pipeline invocation
#[derive(Debug, Error)]
pub enum SendError {
    /// Malformed percent-encoding or an embedded NUL byte
    #[error("malformed resource path")]
    BadRequest,

    /// Traversal attempt, denied dotfile, or trailing-slash directory request
    #[error("access to resource is forbidden")]
    Forbidden,

    /// Missing entity, ignored dotfile, or exhausted index/extension search
    #[error("resource not found")]
    NotFound,

    #[error("precondition failed")]
    PreconditionFailed,

    /// No requested range intersects the entity
    #[error("range not satisfiable for length {length}")]
    RangeNotSatisfiable { length: u64 },

    /// The pipeline was asked to set headers on a response that already flushed them
    #[error("can't set headers after they are sent")]
    HeadersSent,

    #[error("internal error: {source}")]
    Internal {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn internal<E: Into<io::Error>>(e: E) -> Self {
        Self::Internal { source: e.into() }
    }

    /// HTTP status this error renders as
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::HeadersSent | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Headers that belong to the error response itself
    ///
    /// A 416 carries `Content-Range: bytes */<len>` so the client learns the
    /// current representation length.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Self::RangeNotSatisfiable { length } = self {
            headers.insert(
                CONTENT_RANGE,
                HeaderValue::from(crate::http::range::ContentRange::Unsatisfied(*length)),
            );
        }
        headers
    }
}

/// Failure reported by a resource store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entity does not exist")]
    NotFound,

    #[error("a path component is not a directory")]
    NotDirectory,

    #[error("entity name too long")]
    NameTooLong,

    #[error("store i/o error: {source}")]
    Io { source: io::Error },
}

impl StoreError {
    /// True for the miss classes that render as 404
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::NotFound | Self::NotDirectory | Self::NameTooLong)
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::NotADirectory => Self::NotDirectory,
            io::ErrorKind::InvalidFilename => Self::NameTooLong,
            _ => Self::Io { source: e },
        }
    }
}

impl From<StoreError> for SendError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound | StoreError::NotDirectory | StoreError::NameTooLong => {
                Self::NotFound
            }
            StoreError::Io { source } => Self::Internal { source },
        }
    }
}

/// The transport can no longer accept body bytes
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("response stream closed by peer")]
    Closed,
    #[error("peer stopped reading for {0:?}")]
    Stalled(Duration),
}
