//! Caller-supplied callback slots
//!
//! An empty slot means the default behavior runs. The two interception slots
//! (`directory`, `error`) replace the default response entirely; the rest only
//! observe, except `headers`, which may mutate the response before defaults
//! are filled in.

use crate::error::SendError;
use crate::store::EntityMetadata;
use crate::transport::ResponseSink;
use std::fmt;
use std::path::Path;

/// Directory hit on a path without a trailing separator
pub type DirectoryHook = Box<dyn Fn(&mut dyn ResponseSink, &Path) + Send + Sync>;
/// Terminal pipeline failure
pub type ErrorHook = Box<dyn Fn(&mut dyn ResponseSink, &SendError) + Send + Sync>;
/// The entity that is about to be served was located
pub type FileHook = Box<dyn Fn(&Path, &EntityMetadata) + Send + Sync>;
/// Headers are about to be composed
pub type HeadersHook = Box<dyn Fn(&mut dyn ResponseSink, &Path, &EntityMetadata) + Send + Sync>;
/// A byte stream over `start..=end` was opened
pub type StreamHook = Box<dyn Fn(&Path, u64, u64) + Send + Sync>;
/// The body transfer completed with this many bytes
pub type EndHook = Box<dyn Fn(u64) + Send + Sync>;

/// Optional callbacks for a single send
#[derive(Default)]
pub struct Hooks {
    pub directory: Option<DirectoryHook>,
    pub error: Option<ErrorHook>,
    pub file: Option<FileHook>,
    pub headers: Option<HeadersHook>,
    pub stream: Option<StreamHook>,
    pub end: Option<EndHook>,
}

impl Hooks {
    pub(crate) fn file(&self, path: &Path, meta: &EntityMetadata) {
        if let Some(hook) = &self.file {
            hook(path, meta);
        }
    }

    pub(crate) fn headers(&self, sink: &mut dyn ResponseSink, path: &Path, meta: &EntityMetadata) {
        if let Some(hook) = &self.headers {
            hook(sink, path, meta);
        }
    }

    pub(crate) fn stream(&self, path: &Path, start: u64, end: u64) {
        if let Some(hook) = &self.stream {
            hook(path, start, end);
        }
    }

    pub(crate) fn end(&self, sent: u64) {
        if let Some(hook) = &self.end {
            hook(sent);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("directory", &self.directory.is_some())
            .field("error", &self.error.is_some())
            .field("file", &self.file.is_some())
            .field("headers", &self.headers.is_some())
            .field("stream", &self.stream.is_some())
            .field("end", &self.end.is_some())
            .finish()
    }
}
