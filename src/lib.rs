//! Static file transfer engine
//!
//! Resolves a request path against a resource store, applies conditional
//! request and byte-range semantics, and streams the selected bytes into a
//! response sink. The `static_send` binary wires the engine to a hyper server.

pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod send;
pub mod store;
pub mod transport;

pub use config::{DotfilesPolicy, SendOptions};
pub use error::{SendError, SinkError, StoreError};
pub use send::{send, Hooks, Interception, Outcome, SendStream};
pub use store::{EntityMetadata, FsStore, MemoryStore, ResourceStore};
pub use transport::{BufferedSink, HyperSink, RequestView, ResponseSink};
