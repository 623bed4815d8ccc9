//! Conditional request evaluation
//!
//! Runs against the validators the response is about to carry, so caller-preset
//! `ETag`/`Last-Modified` values take part exactly as they will be sent.

use crate::http::cache::{self, Validators};
use crate::transport::{RequestView, ResponseSink};
use hyper::header::{
    HeaderName, ETAG, IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_RANGE, IF_UNMODIFIED_SINCE,
    LAST_MODIFIED,
};

/// Per-request verdict; never reused across requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConditionalVerdict {
    pub precondition_failed: bool,
    pub not_modified: bool,
}

/// Owned copy of the response validators
#[derive(Debug, Clone, Default)]
pub struct ResponseValidators {
    etag: Option<String>,
    last_modified: Option<String>,
}

impl ResponseValidators {
    pub fn from_sink<R: ResponseSink + ?Sized>(sink: &R) -> Self {
        let value = |name: &HeaderName| {
            sink.header(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            etag: value(&ETAG),
            last_modified: value(&LAST_MODIFIED),
        }
    }

    pub fn as_validators(&self) -> Validators<'_> {
        Validators {
            etag: self.etag.as_deref(),
            last_modified: self.last_modified.as_deref(),
        }
    }
}

/// Whether the request carries any of the four `If-*` validators
pub fn is_conditional(request: &RequestView<'_>) -> bool {
    [IF_MATCH, IF_UNMODIFIED_SINCE, IF_NONE_MATCH, IF_MODIFIED_SINCE]
        .iter()
        .any(|name| request.headers.contains_key(name))
}

/// Evaluate preconditions, then freshness
///
/// `cacheable` reflects whether the response status would be 2xx or 304.
/// Freshness is not considered once a precondition has failed.
pub fn evaluate(
    request: &RequestView<'_>,
    current: Validators<'_>,
    cacheable: bool,
) -> ConditionalVerdict {
    if !is_conditional(request) {
        return ConditionalVerdict::default();
    }

    if is_precondition_failure(request, current) {
        return ConditionalVerdict {
            precondition_failed: true,
            not_modified: false,
        };
    }

    ConditionalVerdict {
        precondition_failed: false,
        not_modified: cacheable && cache::is_fresh(request.headers, current),
    }
}

fn is_precondition_failure(request: &RequestView<'_>, current: Validators<'_>) -> bool {
    if let Some(list) = request.header(&IF_MATCH) {
        return match current.etag {
            None => true,
            Some(_) if list.trim() == "*" => false,
            Some(etag) => !cache::check_etag_match(list, etag),
        };
    }

    if let Some(since) = request
        .header(&IF_UNMODIFIED_SINCE)
        .and_then(cache::parse_http_date)
    {
        return match current.last_modified.and_then(cache::parse_http_date) {
            Some(modified) => modified > since,
            None => true,
        };
    }

    false
}

/// Whether an `If-Range` validator still matches the representation
///
/// A quoted value is compared against the `ETag`, anything else is taken as
/// a date that must not be older than `Last-Modified`. No header is fresh.
pub fn is_range_fresh(request: &RequestView<'_>, current: Validators<'_>) -> bool {
    let Some(if_range) = request.header(&IF_RANGE) else {
        return true;
    };

    if if_range.contains('"') {
        return current.etag.is_some_and(|etag| if_range.contains(etag));
    }

    match (
        current.last_modified.and_then(cache::parse_http_date),
        cache::parse_http_date(if_range),
    ) {
        (Some(modified), Some(date)) => modified <= date,
        _ => false,
    }
}
