//! Header composer
//!
//! Fills response headers the caller has not set. Nothing already present on
//! the sink is overwritten, except the length and range of the chosen window.

use super::locator::Entity;
use super::planner::{RangePlan, TransferWindow};
use crate::config::SendOptions;
use crate::http::{cache, header_value, mime};
use crate::transport::ResponseSink;
use hyper::header::{
    HeaderName, HeaderValue, ACCEPT_RANGES, CACHE_CONTROL, CONTENT_ENCODING, CONTENT_LANGUAGE,
    CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG, LAST_MODIFIED,
};

fn set_if_absent<R: ResponseSink + ?Sized>(
    sink: &mut R,
    name: HeaderName,
    value: impl FnOnce() -> HeaderValue,
) {
    if sink.header(&name).is_none() {
        sink.set_header(name, value());
    }
}

/// `Cache-Control` value for the configured max-age
pub fn cache_control_value(options: &SendOptions) -> String {
    let mut value = format!("public, max-age={}", options.max_age_secs());
    if options.immutable {
        value.push_str(", immutable");
    }
    value
}

/// Apply the validator and caching defaults for `entity`
///
/// Runs before conditional evaluation so that the validators on the sink are
/// the ones the response will carry.
pub fn compose<R: ResponseSink + ?Sized>(sink: &mut R, options: &SendOptions, entity: &Entity) {
    if options.accept_ranges {
        set_if_absent(sink, ACCEPT_RANGES, || HeaderValue::from_static("bytes"));
    }

    if options.cache_control {
        set_if_absent(sink, CACHE_CONTROL, || {
            header_value(cache_control_value(options))
        });
    }

    if options.last_modified {
        set_if_absent(sink, LAST_MODIFIED, || {
            header_value(cache::format_http_date(entity.meta.modified))
        });
    }

    if options.etag {
        set_if_absent(sink, ETAG, || {
            header_value(cache::generate_etag(&entity.meta, options.weak_etag))
        });
    }

    if let Some(content_type) = mime::content_type(&entity.path) {
        set_if_absent(sink, CONTENT_TYPE, || header_value(content_type));
    }
}

/// Set the status, `Content-Range` and `Content-Length` of a successful plan
pub fn apply_window<R: ResponseSink + ?Sized>(
    sink: &mut R,
    plan: &RangePlan,
    window: &TransferWindow,
) {
    if let Some(status) = plan.status() {
        sink.set_status(status);
    }
    if let Some(content_range) = plan.content_range() {
        sink.set_header(CONTENT_RANGE, HeaderValue::from(content_range));
    }
    sink.set_header(CONTENT_LENGTH, HeaderValue::from(window.length));
}

/// Drop the headers that describe a body, for 304 responses
pub fn remove_content_headers<R: ResponseSink + ?Sized>(sink: &mut R) {
    for name in [
        CONTENT_ENCODING,
        CONTENT_LANGUAGE,
        CONTENT_LENGTH,
        CONTENT_RANGE,
        CONTENT_TYPE,
    ] {
        sink.remove_header(&name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::range::ByteRange;
    use crate::store::EntityMetadata;
    use crate::transport::BufferedSink;
    use hyper::StatusCode;
    use std::path::PathBuf;
    use std::time::{Duration, UNIX_EPOCH};

    fn entity(name: &str) -> Entity {
        Entity {
            path: PathBuf::from(name),
            meta: EntityMetadata {
                size: 500,
                modified: UNIX_EPOCH + Duration::from_secs(1_445_412_480),
                is_dir: false,
            },
        }
    }

    #[test]
    fn test_defaults() {
        let mut sink = BufferedSink::new();
        compose(&mut sink, &SendOptions::default(), &entity("/srv/a.html"));

        assert_eq!(sink.header(&ACCEPT_RANGES).unwrap(), "bytes");
        assert_eq!(sink.header(&CACHE_CONTROL).unwrap(), "public, max-age=0");
        assert_eq!(
            sink.header(&LAST_MODIFIED).unwrap(),
            "Wed, 21 Oct 2015 07:28:00 GMT"
        );
        assert!(sink
            .header(&ETAG)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("W/\"1f4-"));
        assert_eq!(
            sink.header(&CONTENT_TYPE).unwrap(),
            "text/html; charset=UTF-8"
        );
    }

    #[test]
    fn test_caller_values_win() {
        let mut sink = BufferedSink::new();
        sink.set_header(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        sink.set_header(CONTENT_TYPE, HeaderValue::from_static("text/x-custom"));
        compose(&mut sink, &SendOptions::default(), &entity("/srv/a.html"));

        assert_eq!(sink.header(&CACHE_CONTROL).unwrap(), "no-store");
        assert_eq!(sink.header(&CONTENT_TYPE).unwrap(), "text/x-custom");
    }

    #[test]
    fn test_disabled_headers() {
        let opts = SendOptions {
            accept_ranges: false,
            cache_control: false,
            etag: false,
            last_modified: false,
            ..SendOptions::default()
        };
        let mut sink = BufferedSink::new();
        compose(&mut sink, &opts, &entity("/srv/blob.unknownext"));
        assert!(sink.headers().is_empty());
    }

    #[test]
    fn test_cache_control_value() {
        let opts = SendOptions {
            max_age_ms: 86_400_000,
            immutable: true,
            ..SendOptions::default()
        };
        assert_eq!(cache_control_value(&opts), "public, max-age=86400, immutable");
    }

    #[test]
    fn test_apply_partial_window() {
        let plan = RangePlan::PartialBody {
            range: ByteRange { start: 0, end: 9 },
            total: 100,
        };
        let mut sink = BufferedSink::new();
        apply_window(&mut sink, &plan, &plan.window(0));
        assert_eq!(sink.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(sink.header(&CONTENT_RANGE).unwrap(), "bytes 0-9/100");
        assert_eq!(sink.header(&CONTENT_LENGTH).unwrap(), "10");
    }

    #[test]
    fn test_remove_content_headers() {
        let mut sink = BufferedSink::new();
        compose(&mut sink, &SendOptions::default(), &entity("/srv/a.html"));
        sink.set_header(CONTENT_LENGTH, HeaderValue::from(500u64));
        remove_content_headers(&mut sink);
        assert!(sink.header(&CONTENT_TYPE).is_none());
        assert!(sink.header(&CONTENT_LENGTH).is_none());
        assert!(sink.header(&ETAG).is_some());
    }
}
