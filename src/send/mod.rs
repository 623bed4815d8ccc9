//! Send pipeline
//!
//! [`send`] prepares a [`SendStream`] for one request; [`SendStream::deliver`]
//! resolves the path, locates the entity, evaluates conditional headers, plans
//! the byte range, composes headers and streams the body into a response sink.
//! Any stage can end the response early with an error or redirect document.
//!
//! # Examples
//! ```no_run
//! use static_send::config::SendOptions;
//! use static_send::store::FsStore;
//! use static_send::transport::{BufferedSink, RequestView};
//! use hyper::{HeaderMap, Method};
//!
//! # async fn run() {
//! let store = FsStore::default();
//! let options = SendOptions::with_root("/srv/www");
//! let headers = HeaderMap::new();
//! let request = RequestView::new(&Method::GET, &headers);
//!
//! let mut sink = BufferedSink::new();
//! let outcome = static_send::send(&store, request, "/index.html", &options)
//!     .on_file(|path, meta| println!("{} ({} bytes)", path.display(), meta.size))
//!     .deliver(&mut sink)
//!     .await;
//! println!("{outcome:?}");
//! # }
//! ```

pub mod conditional;
pub mod headers;
pub mod hooks;
pub mod locator;
pub mod planner;
pub mod transfer;

#[cfg(test)]
pub(crate) mod test_support;

pub use hooks::Hooks;

use self::conditional::ResponseValidators;
use self::locator::{Entity, Located};
use self::planner::RangePlan;
use self::transfer::Transferred;
use crate::config::SendOptions;
use crate::error::SendError;
use crate::http::{path, response};
use crate::logger;
use crate::store::{EntityMetadata, ResourceStore};
use crate::transport::{RequestView, ResponseSink};
use hyper::StatusCode;
use std::io;
use std::path::{Path, PathBuf};

/// What a hook took over
#[derive(Debug)]
pub enum Interception {
    /// Directory requested without a trailing slash
    Directory(PathBuf),
    Error(SendError),
}

/// How a delivery ended
#[derive(Debug)]
pub enum Outcome {
    /// Entity headers and body (none for HEAD) were sent
    Sent { status: StatusCode, bytes: u64 },
    NotModified,
    Redirected { location: String },
    /// An error document was rendered
    Failed { status: StatusCode },
    /// A hook took over; the caller completes the response
    Intercepted(Interception),
    /// The response was cut short after this many body bytes
    Aborted { bytes: u64 },
}

impl Outcome {
    /// Status written by the pipeline itself, if any
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Sent { status, .. } | Self::Failed { status } => Some(*status),
            Self::NotModified => Some(StatusCode::NOT_MODIFIED),
            Self::Redirected { .. } => Some(StatusCode::MOVED_PERMANENTLY),
            Self::Intercepted(_) | Self::Aborted { .. } => None,
        }
    }

    /// Entity body bytes written
    pub const fn bytes(&self) -> u64 {
        match self {
            Self::Sent { bytes, .. } | Self::Aborted { bytes } => *bytes,
            _ => 0,
        }
    }
}

/// A prepared transfer for one request
pub struct SendStream<'a, S: ?Sized> {
    store: &'a S,
    request: RequestView<'a>,
    path: &'a str,
    options: &'a SendOptions,
    hooks: Hooks,
}

/// Prepare a transfer of the resource at `path` (raw, percent-encoded)
pub fn send<'a, S: ResourceStore + ?Sized>(
    store: &'a S,
    request: RequestView<'a>,
    path: &'a str,
    options: &'a SendOptions,
) -> SendStream<'a, S> {
    SendStream {
        store,
        request,
        path,
        options,
        hooks: Hooks::default(),
    }
}

impl<S: ResourceStore + ?Sized> SendStream<'_, S> {
    /// Replace every hook at once
    #[must_use]
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Take over directory requests that lack a trailing slash
    #[must_use]
    pub fn on_directory<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut dyn ResponseSink, &Path) + Send + Sync + 'static,
    {
        self.hooks.directory = Some(Box::new(hook));
        self
    }

    /// Take over error responses
    #[must_use]
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut dyn ResponseSink, &SendError) + Send + Sync + 'static,
    {
        self.hooks.error = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn on_file<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Path, &EntityMetadata) + Send + Sync + 'static,
    {
        self.hooks.file = Some(Box::new(hook));
        self
    }

    /// Adjust headers before the defaults are filled in
    #[must_use]
    pub fn on_headers<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut dyn ResponseSink, &Path, &EntityMetadata) + Send + Sync + 'static,
    {
        self.hooks.headers = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn on_stream<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Path, u64, u64) + Send + Sync + 'static,
    {
        self.hooks.stream = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn on_end<F>(mut self, hook: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.hooks.end = Some(Box::new(hook));
        self
    }

    /// Run the pipeline against `sink`
    pub async fn deliver<R: ResponseSink>(self, sink: &mut R) -> Outcome {
        match self.run(sink).await {
            Ok(outcome) => outcome,
            Err(err) => self.fail(sink, err).await,
        }
    }

    fn has_trailing_slash(&self) -> bool {
        self.path.ends_with('/')
    }

    async fn run<R: ResponseSink>(&self, sink: &mut R) -> Result<Outcome, SendError> {
        let location = path::resolve(self.path, self.options.root.as_deref())?;
        path::check_dotfiles(&location, self.options.dotfiles)?;

        let located = locator::locate(
            self.store,
            &location,
            self.has_trailing_slash(),
            self.options,
        )
        .await?;

        match located {
            Located::File(entity) => self.send_file(sink, &entity).await,
            Located::Directory(dir) => self.redirect(sink, dir).await,
        }
    }

    async fn redirect<R: ResponseSink>(
        &self,
        sink: &mut R,
        dir: PathBuf,
    ) -> Result<Outcome, SendError> {
        if let Some(hook) = &self.hooks.directory {
            hook(sink as &mut dyn ResponseSink, &dir);
            return Ok(Outcome::Intercepted(Interception::Directory(dir)));
        }

        if self.has_trailing_slash() {
            return Err(SendError::Forbidden);
        }

        let target = format!("{}/", self.path);
        Ok(
            match response::send_redirect(sink, &target, self.request.is_head()).await {
                Ok(location) => Outcome::Redirected { location },
                Err(_) => Outcome::Aborted { bytes: 0 },
            },
        )
    }

    async fn send_file<R: ResponseSink>(
        &self,
        sink: &mut R,
        entity: &Entity,
    ) -> Result<Outcome, SendError> {
        logger::log_file_resolved(&entity.path, entity.meta.size);
        self.hooks.file(&entity.path, &entity.meta);

        if sink.headers_sent() {
            return Err(SendError::HeadersSent);
        }

        self.hooks.headers(sink, &entity.path, &entity.meta);
        headers::compose(sink, self.options, entity);

        let validators = ResponseValidators::from_sink(sink);
        let current = validators.as_validators();

        let status = sink.status();
        let cacheable = status.is_success() || status == StatusCode::NOT_MODIFIED;
        let verdict = conditional::evaluate(&self.request, current, cacheable);
        if verdict.precondition_failed {
            return Err(SendError::PreconditionFailed);
        }
        if verdict.not_modified {
            return Ok(not_modified(sink, &entity.path).await);
        }

        let plan = planner::plan(&self.request, self.options, entity.meta.size, current);
        match plan {
            RangePlan::Unsatisfiable { total } => {
                return Err(SendError::RangeNotSatisfiable { length: total });
            }
            RangePlan::PartialBody { range, total } => {
                logger::log_range(&entity.path, range.start, range.end, total);
            }
            RangePlan::FullBody { .. } => {}
        }

        let window = plan.window(self.options.offset());
        headers::apply_window(sink, &plan, &window);
        let status = sink.status();

        if self.request.is_head() {
            return Ok(match sink.end(None).await {
                Ok(()) => Outcome::Sent { status, bytes: 0 },
                Err(_) => Outcome::Aborted { bytes: 0 },
            });
        }

        Ok(
            match transfer::transfer(self.store, sink, &entity.path, window, &self.hooks).await? {
                Transferred::Complete(bytes) => Outcome::Sent { status, bytes },
                Transferred::Aborted(bytes) => Outcome::Aborted { bytes },
            },
        )
    }

    async fn fail<R: ResponseSink>(&self, sink: &mut R, err: SendError) -> Outcome {
        let status = err.status();
        logger::log_send_error(status, &err);

        if let Some(hook) = &self.hooks.error {
            hook(sink as &mut dyn ResponseSink, &err);
            return Outcome::Intercepted(Interception::Error(err));
        }

        // The status line is already out; all that is left is cutting the body short
        if sink.headers_sent() {
            sink.abort(io::Error::other(err.to_string())).await;
            return Outcome::Aborted { bytes: 0 };
        }

        match response::send_error(sink, &err, self.request.is_head()).await {
            Ok(()) => Outcome::Failed { status },
            Err(_) => Outcome::Aborted { bytes: 0 },
        }
    }
}

async fn not_modified<R: ResponseSink>(sink: &mut R, path: &Path) -> Outcome {
    logger::log_not_modified(path);
    headers::remove_content_headers(sink);
    sink.set_status(StatusCode::NOT_MODIFIED);
    match sink.end(None).await {
        Ok(()) => Outcome::NotModified,
        Err(_) => Outcome::Aborted { bytes: 0 },
    }
}
