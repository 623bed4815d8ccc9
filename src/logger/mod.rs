//! Logger module
//!
//! Provides logging utilities for the transfer engine and the server including:
//! - Subscriber initialization from configuration
//! - Server lifecycle and connection logging
//! - Access logging
//! - Pipeline events (path rejection, file discovery, stream lifecycle)

use crate::config::LoggingConfig;
use hyper::{Method, StatusCode};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber with configuration
///
/// Should be called once at application startup. `RUST_LOG` overrides the
/// configured level.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
}

pub fn log_server_start(addr: &SocketAddr, root: Option<&Path>, workers: Option<usize>) {
    tracing::info!(%addr, "async server started successfully");
    if let Some(root) = root {
        tracing::info!(root = %root.display(), "serving files");
    }
    if let Some(workers) = workers {
        tracing::info!(workers, "worker threads");
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!(%peer_addr, "connection accepted");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!(?err, "failed to serve connection");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// One line per completed request
pub fn log_access(method: &Method, path: &str, status: StatusCode, bytes: u64, elapsed: Duration) {
    tracing::info!(
        target: "access",
        %method,
        path,
        status = status.as_u16(),
        bytes,
        elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
    );
}

pub fn log_traversal_blocked(raw_path: &str) {
    tracing::warn!(path = raw_path, "path traversal attempt blocked");
}

pub fn log_stat_miss(path: &Path) {
    tracing::debug!(path = %path.display(), "stat miss");
}

pub fn log_file_resolved(path: &Path, size: u64) {
    tracing::info!(path = %path.display(), size, "file resolved");
}

pub fn log_not_modified(path: &Path) {
    tracing::debug!(path = %path.display(), "not modified");
}

pub fn log_range(path: &Path, start: u64, end: u64, total: u64) {
    tracing::debug!(path = %path.display(), start, end, total, "partial content");
}

pub fn log_send_error(status: StatusCode, err: &crate::error::SendError) {
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), %err, "send failed");
    } else {
        tracing::debug!(status = status.as_u16(), %err, "send rejected");
    }
}

pub fn log_stream_opened(path: &Path, start: u64, end: u64) {
    tracing::trace!(path = %path.display(), start, end, "stream opened");
}

pub fn log_stream_released(path: &Path, sent: u64) {
    tracing::trace!(path = %path.display(), sent, "stream released");
}

pub fn log_stream_aborted(path: &Path, reason: &str) {
    tracing::warn!(path = %path.display(), reason, "transfer aborted");
}
