//! HTTP Range request parsing module
//!
//! Range header parsing for resumable downloads, compliant with RFC 7233.

use hyper::header::HeaderValue;
use std::fmt;

/// Inclusive byte range within an entity of known length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte position
    pub start: u64,
    /// Last byte position (inclusive)
    pub end: u64,
}

#[allow(clippy::len_without_is_empty)]
impl ByteRange {
    /// Number of bytes covered by the range
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// At least one satisfiable range, in request order
    Ranges(Vec<ByteRange>),
    /// Syntactically valid, but no range intersects the entity - should return 416
    Unsatisfiable,
    /// Not a `bytes` range or malformed (ignore, return full content)
    Malformed,
}

/// Check whether a Range header is a byte range at all (`^ *bytes=`)
pub fn is_bytes_range(header: &str) -> bool {
    header.trim_start_matches(' ').starts_with("bytes=")
}

/// Parse HTTP Range header (bytes unit, one or more ranges)
///
/// Supported formats per comma-separated spec:
/// - `start-end` - Specific range
/// - `start-` - From start to end
/// - `-suffix` - Last suffix bytes
///
/// With `combine` set, overlapping and adjacent ranges are merged while keeping
/// the order in which they first appear.
///
/// # Examples
/// ```
/// use static_send::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// let result = parse_range_header("bytes=0-99", 1000, false);
/// assert_eq!(result, RangeParseResult::Ranges(vec![ByteRange { start: 0, end: 99 }]));
///
/// let result = parse_range_header("bytes=2000-", 1000, false);
/// assert_eq!(result, RangeParseResult::Unsatisfiable);
/// ```
pub fn parse_range_header(header: &str, size: u64, combine: bool) -> RangeParseResult {
    let Some((_, specs)) = header.split_once('=') else {
        return RangeParseResult::Malformed;
    };
    if !is_bytes_range(header) {
        return RangeParseResult::Malformed;
    }

    let mut ranges = Vec::new();
    for spec in specs.split(',') {
        match parse_spec(spec.trim(), size) {
            Spec::Range(range) => ranges.push(range),
            Spec::Skip => {}
            Spec::Invalid => return RangeParseResult::Malformed,
        }
    }

    if ranges.is_empty() {
        return RangeParseResult::Unsatisfiable;
    }

    if combine {
        ranges = combine_ranges(ranges);
    }
    RangeParseResult::Ranges(ranges)
}

enum Spec {
    Range(ByteRange),
    /// Well-formed but outside the entity
    Skip,
    Invalid,
}

fn parse_spec(spec: &str, size: u64) -> Spec {
    let Some((start_str, end_str)) = spec.split_once('-') else {
        return Spec::Invalid;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    // Suffix range: "-500" means last 500 bytes
    if start_str.is_empty() {
        return parse_suffix_range(end_str, size);
    }

    // Standard range: "start-" or "start-end"
    parse_standard_range(start_str, end_str, size)
}

/// Parse suffix range (e.g., "-500")
fn parse_suffix_range(suffix_str: &str, size: u64) -> Spec {
    let Some(suffix) = parse_pos(suffix_str) else {
        return Spec::Invalid;
    };

    if suffix == 0 || size == 0 {
        return Spec::Skip;
    }

    // Suffix larger than the entity is valid, just selects the whole entity
    Spec::Range(ByteRange {
        start: size.saturating_sub(suffix),
        end: size - 1,
    })
}

/// Parse standard range (e.g., "0-99" or "100-")
fn parse_standard_range(start_str: &str, end_str: &str, size: u64) -> Spec {
    let Some(start) = parse_pos(start_str) else {
        return Spec::Invalid;
    };

    let end = if end_str.is_empty() {
        None
    } else {
        let Some(e) = parse_pos(end_str) else {
            return Spec::Invalid;
        };
        Some(e)
    };

    // Start beyond entity size is not satisfiable
    if start >= size {
        return Spec::Skip;
    }

    // Clamp end to size - 1
    let end = end.map_or(size - 1, |e| e.min(size - 1));
    if start > end {
        return Spec::Skip;
    }

    Spec::Range(ByteRange { start, end })
}

/// Digits only: no sign, no whitespace inside
fn parse_pos(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Merge overlapping and adjacent ranges, keeping first-appearance order
fn combine_ranges(ranges: Vec<ByteRange>) -> Vec<ByteRange> {
    let mut indexed: Vec<(usize, ByteRange)> = ranges.into_iter().enumerate().collect();
    indexed.sort_by_key(|(_, r)| r.start);

    let mut merged: Vec<(usize, ByteRange)> = Vec::with_capacity(indexed.len());
    for (index, range) in indexed {
        match merged.last_mut() {
            Some((first_index, last)) if range.start <= last.end.saturating_add(1) => {
                last.end = last.end.max(range.end);
                *first_index = (*first_index).min(index);
            }
            _ => merged.push((index, range)),
        }
    }

    merged.sort_by_key(|(index, _)| *index);
    merged.into_iter().map(|(_, r)| r).collect()
}

/// `Content-Range` header value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRange {
    /// `bytes start-end/len`
    Satisfied(ByteRange, u64),
    /// `bytes */len`
    Unsatisfied(u64),
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Satisfied(range, len) => write!(f, "bytes {}-{}/{len}", range.start, range.end),
            Self::Unsatisfied(len) => write!(f, "bytes */{len}"),
        }
    }
}

impl From<ContentRange> for HeaderValue {
    fn from(value: ContentRange) -> Self {
        super::header_value(value.to_string())
    }
}
