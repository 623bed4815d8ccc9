//! Request path resolution module
//!
//! Turns the raw, percent-encoded request path into a filesystem location and
//! enforces the traversal and dotfile rules on the way.

use crate::config::DotfilesPolicy;
use crate::error::SendError;
use crate::logger;
use std::path::{Component, Path, PathBuf};

/// Validated filesystem location for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    /// Absolute (or root-anchored) location
    pub path: PathBuf,
    /// Normalized path segments used to reach `path`, for dotfile inspection
    pub segments: Vec<String>,
    /// The normalized path ended with a separator
    pub trailing_separator: bool,
}

/// Percent-decode a request path
///
/// Fails on escapes that are not followed by two hex digits, and on byte
/// sequences that do not decode to UTF-8.
pub fn decode_path(raw: &str) -> Result<String, SendError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(SendError::BadRequest);
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    urlencoding::decode(raw)
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| SendError::BadRequest)
}

/// Normalize a `/`-separated path the POSIX way
///
/// Empty and `.` segments are dropped, `..` consumes the previous segment where
/// one exists, and a trailing separator is preserved.
pub fn normalize(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let absolute = path.starts_with('/');
    let trailing = path.ends_with('/');

    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if out.last().is_some_and(|s| *s != "..") {
                    out.pop();
                } else if !absolute {
                    out.push("..");
                }
            }
            s => out.push(s),
        }
    }

    let mut normalized = out.join("/");
    if absolute {
        normalized.insert(0, '/');
    }
    if normalized.is_empty() {
        normalized.push('.');
    }
    if trailing && !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

/// A `..` segment bounded by a separator (either slash) or a path edge
pub fn has_up_path(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}

/// Resolve a raw request path, optionally confined to `root`
pub fn resolve(raw: &str, root: Option<&Path>) -> Result<ResolvedLocation, SendError> {
    let decoded = decode_path(raw)?;

    if decoded.contains('\0') {
        return Err(SendError::BadRequest);
    }

    match root {
        Some(root) => resolve_in_root(raw, &decoded, root),
        None => resolve_unrooted(raw, &decoded),
    }
}

fn resolve_in_root(raw: &str, decoded: &str, root: &Path) -> Result<ResolvedLocation, SendError> {
    let relative = if decoded.is_empty() {
        String::new()
    } else {
        normalize(&format!("./{decoded}"))
    };

    // Checked on the relative form, before joining can absorb the traversal
    if has_up_path(&relative) {
        logger::log_traversal_blocked(raw);
        return Err(SendError::Forbidden);
    }

    let segments: Vec<String> = relative.split('/').map(str::to_string).collect();

    let mut path = root.to_path_buf();
    for segment in segments.iter().filter(|s| !s.is_empty() && *s != ".") {
        path.push(segment);
    }

    // The joined location must still sit below the root
    let escapes = path
        .strip_prefix(root)
        .map_or(true, |rest| rest.components().any(|c| c == Component::ParentDir));
    if escapes {
        logger::log_traversal_blocked(raw);
        return Err(SendError::Forbidden);
    }

    Ok(ResolvedLocation {
        path,
        trailing_separator: relative.ends_with('/'),
        segments,
    })
}

fn resolve_unrooted(raw: &str, decoded: &str) -> Result<ResolvedLocation, SendError> {
    if has_up_path(decoded) {
        logger::log_traversal_blocked(raw);
        return Err(SendError::Forbidden);
    }

    let normalized = normalize(decoded);
    let path = std::path::absolute(&normalized).map_err(SendError::internal)?;

    Ok(ResolvedLocation {
        path,
        trailing_separator: normalized.ends_with('/'),
        segments: normalized.split('/').map(str::to_string).collect(),
    })
}

/// A segment is a dotfile if it starts with `.` and is not the bare `.`
pub fn is_dotfile(segment: &str) -> bool {
    segment.len() > 1 && segment.starts_with('.')
}

/// Apply the dotfile policy to a resolved location
pub fn check_dotfiles(location: &ResolvedLocation, policy: DotfilesPolicy) -> Result<(), SendError> {
    if !location.segments.iter().any(|s| is_dotfile(s)) {
        return Ok(());
    }

    match policy {
        DotfilesPolicy::Allow => Ok(()),
        DotfilesPolicy::Deny => Err(SendError::Forbidden),
        DotfilesPolicy::Ignore => Err(SendError::NotFound),
    }
}
