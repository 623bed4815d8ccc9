//! HTTP cache control module
//!
//! Provides `ETag` generation, HTTP-date handling and the validator comparisons
//! behind conditional requests.

use crate::store::EntityMetadata;
use chrono::{DateTime, NaiveDateTime, Utc};
use hyper::header::{HeaderMap, CACHE_CONTROL, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use std::time::{SystemTime, UNIX_EPOCH};

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
/// Obsolete RFC 850 form, e.g. `Sunday, 06-Nov-94 08:49:37 GMT`
const RFC850_DATE: &str = "%A, %d-%b-%y %H:%M:%S GMT";
/// ANSI C `asctime()` form, e.g. `Sun Nov  6 08:49:37 1994`
const ASCTIME_DATE: &str = "%a %b %e %H:%M:%S %Y";

/// Generate `ETag` from entity size and modification time
///
/// # Returns
/// Quoted `ETag` string, e.g. `W/"1f4-18c2a9b3e10"`
pub fn generate_etag(meta: &EntityMetadata, weak: bool) -> String {
    let mtime = meta
        .modified
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    let tag = format!("\"{:x}-{mtime:x}\"", meta.size);
    if weak {
        format!("W/{tag}")
    } else {
        tag
    }
}

/// Format a timestamp as an HTTP date (IMF-fixdate)
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(IMF_FIXDATE).to_string()
}

/// Parse an HTTP date in any of the three RFC 7231 forms
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    [IMF_FIXDATE, RFC850_DATE, ASCTIME_DATE]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Split a comma-separated token list (`If-Match`, `If-None-Match`)
pub fn parse_token_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Compare a client-supplied entity tag with the current one
///
/// Weak comparison: a `W/` prefix on either side is ignored.
pub fn etag_matches(candidate: &str, etag: &str) -> bool {
    candidate == etag || format!("W/{candidate}") == etag || candidate == format!("W/{etag}")
}

/// Check if any tag in a token list matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
///
/// `*` is not treated specially here; callers decide what a wildcard means.
pub fn check_etag_match(list: &str, etag: &str) -> bool {
    parse_token_list(list).any(|t| etag_matches(t, etag))
}

/// Current representation validators as they will appear on the response
#[derive(Debug, Clone, Copy, Default)]
pub struct Validators<'a> {
    pub etag: Option<&'a str>,
    pub last_modified: Option<&'a str>,
}

/// Freshness check: does the client's cached copy still match?
///
/// Returns false when the request carries no validators at all, when it asks
/// for `Cache-Control: no-cache`, or when either validator is stale.
pub fn is_fresh(req: &HeaderMap, current: Validators<'_>) -> bool {
    let none_match = header_str(req, &IF_NONE_MATCH);
    let modified_since = header_str(req, &IF_MODIFIED_SINCE);

    if none_match.is_none() && modified_since.is_none() {
        return false;
    }

    if header_str(req, &CACHE_CONTROL).is_some_and(has_no_cache) {
        return false;
    }

    if let Some(list) = none_match.filter(|v| v.trim() != "*") {
        let Some(etag) = current.etag else {
            return false;
        };
        if !check_etag_match(list, etag) {
            return false;
        }
    }

    if let Some(since) = modified_since {
        let modified = current.last_modified.and_then(parse_http_date);
        match (modified, parse_http_date(since)) {
            (Some(modified), Some(since)) if modified <= since => {}
            _ => return false,
        }
    }

    true
}

/// `no-cache` as a standalone directive
fn has_no_cache(value: &str) -> bool {
    value
        .split(',')
        .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
}

/// Header value as a string, treating non-ASCII values as absent
pub fn header_str<'a>(headers: &'a HeaderMap, name: &hyper::header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
