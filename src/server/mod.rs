// Server module entry point
// Listener creation, connection handling and request dispatch to the engine

pub mod connection;
pub mod handler;
pub mod listener;

use static_send::config::Config;
use static_send::FsStore;

// Re-export commonly used items
pub use connection::accept_connection;
pub use listener::create_reusable_listener;

/// State shared by every connection
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub store: FsStore,
}

impl AppState {
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            store: FsStore::new(),
        }
    }
}
