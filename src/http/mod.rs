//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! transfer pipeline: path resolution, validators, ranges, media types and the
//! minimal HTML responses.

pub mod cache;
pub mod mime;
pub mod path;
pub mod range;
pub mod response;

use hyper::header::HeaderValue;

// Re-export commonly used types
pub use path::ResolvedLocation;
pub use range::{parse_range_header, ByteRange, ContentRange, RangeParseResult};
pub use response::{send_error, send_redirect};

/// Build a header value from text the crate generated itself
///
/// Generated values are visible ASCII; anything else is logged and replaced
/// by an empty value rather than aborting the response.
pub fn header_value(value: String) -> HeaderValue {
    HeaderValue::try_from(value).unwrap_or_else(|e| {
        crate::logger::log_error(&format!("Failed to build header value: {e}"));
        HeaderValue::from_static("")
    })
}
