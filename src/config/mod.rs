// Configuration module entry point
// Server configuration loading and the per-invocation send options

mod options;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use options::{DotfilesPolicy, SendOptions, MAX_MAX_AGE_MS};
pub use types::{Config, ConnectionConfig, LoggingConfig, ServerConfig};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("STATIC_SEND").separator("__"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("connection.keep_alive", true)?
            .set_default("connection.header_read_timeout", 30)?
            .set_default("connection.write_stall_timeout", 30)?
            .set_default("send.root", ".")?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults() {
        let cfg = Config::load_from("does-not-exist").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.send.root.as_deref(), Some(std::path::Path::new(".")));
        assert_eq!(cfg.send.index, vec!["index.html"]);
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 8080);
        assert!(cfg.connection.keep_alive);
        assert_eq!(
            cfg.connection.write_stall_timeout(),
            Some(std::time::Duration::from_secs(30))
        );
        assert!(cfg.connection.max_connections.is_none());
    }

    #[test]
    fn test_load_send_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090

[connection]
header_read_timeout = 0
max_connections = 64

[send]
root = "/srv/www"
dotfiles = "deny"
extensions = ["html", "htm"]
index = []
max_age_ms = 86400000
immutable = true
"#
        )
        .unwrap();

        let stem = dir.path().join("server");
        let cfg = Config::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert!(cfg.connection.header_read_timeout().is_none());
        assert_eq!(cfg.connection.max_connections, Some(64));
        assert_eq!(cfg.send.dotfiles, DotfilesPolicy::Deny);
        assert_eq!(cfg.send.extensions, vec!["html", "htm"]);
        assert!(cfg.send.index.is_empty());
        assert_eq!(cfg.send.max_age_secs(), 86_400);
        assert!(cfg.send.immutable);
        assert!(cfg.send.accept_ranges);
    }
}
