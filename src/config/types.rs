// Configuration file model
// One struct per TOML section; `[send]` maps straight onto `SendOptions`

use std::time::Duration;

use super::options::SendOptions;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub connection: ConnectionConfig,
    /// Options applied to every file transfer
    #[serde(default)]
    pub send: SendOptions,
}

/// `[server]`: bind address and runtime size
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Runtime worker threads; one per core when absent
    pub workers: Option<usize>,
}

/// `[logging]`
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default filter directive (`RUST_LOG` takes precedence)
    pub level: String,
    /// Emit one access log event per request
    pub access_log: bool,
}

/// `[connection]`: per-connection limits
///
/// Timeouts are in seconds and bound a single phase (reading one request
/// head, pushing one body frame), never a whole transfer. Zero disables.
#[derive(Debug, Deserialize, Clone)]
pub struct ConnectionConfig {
    /// Serve further requests on the same connection
    pub keep_alive: bool,
    pub header_read_timeout: u64,
    /// How long a body frame may wait on a client that stopped reading
    pub write_stall_timeout: u64,
    /// Open connections beyond this are dropped on accept
    pub max_connections: Option<usize>,
}

impl ConnectionConfig {
    pub const fn header_read_timeout(&self) -> Option<Duration> {
        secs(self.header_read_timeout)
    }

    pub const fn write_stall_timeout(&self) -> Option<Duration> {
        secs(self.write_stall_timeout)
    }
}

const fn secs(value: u64) -> Option<Duration> {
    if value == 0 {
        None
    } else {
        Some(Duration::from_secs(value))
    }
}
