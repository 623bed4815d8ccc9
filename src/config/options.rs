// Send options module
// Immutable per-invocation configuration of the transfer pipeline

use serde::Deserialize;
use std::path::PathBuf;

/// One year, the upper bound for `max_age_ms`
pub const MAX_MAX_AGE_MS: u64 = 60 * 60 * 24 * 365 * 1000;

/// How path segments starting with `.` are treated
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DotfilesPolicy {
    /// Serve dotfiles like any other file
    Allow,
    /// Respond 403
    Deny,
    /// Respond 404, as if the file did not exist
    #[default]
    Ignore,
}

/// Options for a single send invocation
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SendOptions {
    /// Advertise and honor byte ranges
    pub accept_ranges: bool,
    /// Set `Cache-Control` when the caller has not
    pub cache_control: bool,
    /// Set `ETag` when the caller has not
    pub etag: bool,
    /// Generate weak (`W/`) entity tags
    pub weak_etag: bool,
    pub dotfiles: DotfilesPolicy,
    /// Suffixes (no leading dot) tried for extension-less misses, in order
    pub extensions: Vec<String>,
    /// Append `immutable` to `Cache-Control`
    pub immutable: bool,
    /// Index file names for directory requests; empty disables index resolution
    pub index: Vec<String>,
    /// Set `Last-Modified` when the caller has not
    pub last_modified: bool,
    /// `Cache-Control` max-age in milliseconds, clamped to one year
    pub max_age_ms: u64,
    /// First byte of the entity to expose
    pub start: Option<u64>,
    /// Last byte (inclusive) of the entity to expose
    pub end: Option<u64>,
    /// Directory every resolved location must stay within
    pub root: Option<PathBuf>,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            accept_ranges: true,
            cache_control: true,
            etag: true,
            weak_etag: true,
            dotfiles: DotfilesPolicy::default(),
            extensions: Vec::new(),
            immutable: false,
            index: vec!["index.html".to_string()],
            last_modified: true,
            max_age_ms: 0,
            start: None,
            end: None,
            root: None,
        }
    }
}

impl SendOptions {
    /// Options confined to a root directory, everything else default
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// `max-age` directive value in whole seconds
    pub const fn max_age_secs(&self) -> u64 {
        let ms = if self.max_age_ms > MAX_MAX_AGE_MS {
            MAX_MAX_AGE_MS
        } else {
            self.max_age_ms
        };
        ms / 1000
    }

    /// Offset of the first exposed byte
    pub fn offset(&self) -> u64 {
        self.start.unwrap_or(0)
    }
}
