//! Range planner
//!
//! Decides which slice of the entity goes out and with which status.

use super::conditional;
use crate::config::SendOptions;
use crate::http::cache::Validators;
use crate::http::range::{self, ByteRange, ContentRange, RangeParseResult};
use crate::transport::RequestView;
use hyper::header::RANGE;
use hyper::StatusCode;

/// Outcome of range planning, relative to the exposed window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePlan {
    FullBody { length: u64 },
    PartialBody { range: ByteRange, total: u64 },
    Unsatisfiable { total: u64 },
}

/// Absolute slice of the entity to stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferWindow {
    pub offset: u64,
    pub length: u64,
}

impl TransferWindow {
    /// Inclusive last byte; never before `offset`, even for an empty window
    pub const fn end(&self) -> u64 {
        if self.length == 0 {
            self.offset
        } else {
            self.offset + self.length - 1
        }
    }
}

impl RangePlan {
    /// Status the plan produces when it succeeds
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::FullBody { .. } => None,
            Self::PartialBody { .. } => Some(StatusCode::PARTIAL_CONTENT),
            Self::Unsatisfiable { .. } => Some(StatusCode::RANGE_NOT_SATISFIABLE),
        }
    }

    /// `Content-Range` value for partial and unsatisfiable plans
    pub const fn content_range(&self) -> Option<ContentRange> {
        match self {
            Self::FullBody { .. } => None,
            Self::PartialBody { range, total } => Some(ContentRange::Satisfied(*range, *total)),
            Self::Unsatisfiable { total } => Some(ContentRange::Unsatisfied(*total)),
        }
    }

    /// Absolute window for a plan computed over bytes starting at `offset`
    pub const fn window(&self, offset: u64) -> TransferWindow {
        match self {
            Self::FullBody { length } => TransferWindow {
                offset,
                length: *length,
            },
            Self::PartialBody { range, .. } => TransferWindow {
                offset: offset + range.start,
                length: range.len(),
            },
            Self::Unsatisfiable { .. } => TransferWindow { offset, length: 0 },
        }
    }
}

/// Bytes exposed by the configured start/end offsets
pub fn exposed_length(options: &SendOptions, size: u64) -> u64 {
    let offset = options.offset();
    let length = size.saturating_sub(offset);
    match options.end {
        Some(end) => length.min(end.saturating_add(1).saturating_sub(offset)),
        None => length,
    }
}

/// Plan the transfer for an entity of `size` bytes
pub fn plan(
    request: &RequestView<'_>,
    options: &SendOptions,
    size: u64,
    current: Validators<'_>,
) -> RangePlan {
    let length = exposed_length(options, size);
    let full = RangePlan::FullBody { length };

    if !options.accept_ranges {
        return full;
    }
    let Some(header) = request.header(&RANGE).filter(|h| range::is_bytes_range(h)) else {
        return full;
    };

    let parsed = range::parse_range_header(header, length, true);

    // A stale If-Range discards the Range header whatever it parsed to
    if !conditional::is_range_fresh(request, current) {
        return full;
    }

    match parsed {
        RangeParseResult::Unsatisfiable => RangePlan::Unsatisfiable { total: length },
        RangeParseResult::Ranges(ranges) => match ranges.as_slice() {
            [single] => RangePlan::PartialBody {
                range: *single,
                total: length,
            },
            _ => full,
        },
        RangeParseResult::Malformed => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::{HeaderMap, HeaderValue, IF_RANGE};
    use hyper::Method;

    fn plan_for(range: Option<&'static str>, options: &SendOptions, size: u64) -> RangePlan {
        let mut headers = HeaderMap::new();
        if let Some(range) = range {
            headers.insert(RANGE, HeaderValue::from_static(range));
        }
        plan(
            &RequestView::new(&Method::GET, &headers),
            options,
            size,
            Validators::default(),
        )
    }

    #[test]
    fn test_exposed_length() {
        let mut opts = SendOptions::default();
        assert_eq!(exposed_length(&opts, 100), 100);
        opts.start = Some(10);
        assert_eq!(exposed_length(&opts, 100), 90);
        opts.end = Some(19);
        assert_eq!(exposed_length(&opts, 100), 10);
        opts.start = Some(200);
        assert_eq!(exposed_length(&opts, 100), 0);
        opts.start = None;
        opts.end = Some(1_000);
        assert_eq!(exposed_length(&opts, 100), 100);
    }

    #[test]
    fn test_no_range() {
        let opts = SendOptions::default();
        assert_eq!(plan_for(None, &opts, 10), RangePlan::FullBody { length: 10 });
        assert_eq!(plan_for(Some("items=0-1"), &opts, 10), RangePlan::FullBody { length: 10 });
    }

    #[test]
    fn test_single_range() {
        let plan = plan_for(Some("bytes=2-5"), &SendOptions::default(), 10);
        assert_eq!(
            plan,
            RangePlan::PartialBody {
                range: ByteRange { start: 2, end: 5 },
                total: 10
            }
        );
        assert_eq!(plan.status(), Some(StatusCode::PARTIAL_CONTENT));
        assert_eq!(plan.window(0), TransferWindow { offset: 2, length: 4 });
        assert_eq!(plan.window(100), TransferWindow { offset: 102, length: 4 });
    }

    #[test]
    fn test_unsatisfiable() {
        let plan = plan_for(Some("bytes=20-30"), &SendOptions::default(), 10);
        assert_eq!(plan, RangePlan::Unsatisfiable { total: 10 });
        assert_eq!(plan.content_range(), Some(ContentRange::Unsatisfied(10)));
    }

    #[test]
    fn test_multiple_ranges_degrade() {
        let opts = SendOptions::default();
        assert_eq!(
            plan_for(Some("bytes=0-1,5-6"), &opts, 10),
            RangePlan::FullBody { length: 10 }
        );
        // adjacent ranges combine into one
        assert_eq!(
            plan_for(Some("bytes=0-1,2-3"), &opts, 10),
            RangePlan::PartialBody {
                range: ByteRange { start: 0, end: 3 },
                total: 10
            }
        );
    }

    #[test]
    fn test_ranges_disabled() {
        let opts = SendOptions {
            accept_ranges: false,
            ..SendOptions::default()
        };
        assert_eq!(plan_for(Some("bytes=0-1"), &opts, 10), RangePlan::FullBody { length: 10 });
    }

    #[test]
    fn test_range_within_offsets() {
        let opts = SendOptions {
            start: Some(4),
            end: Some(7),
            ..SendOptions::default()
        };
        let plan = plan_for(Some("bytes=1-"), &opts, 10);
        assert_eq!(
            plan,
            RangePlan::PartialBody {
                range: ByteRange { start: 1, end: 3 },
                total: 4
            }
        );
        assert_eq!(plan.window(4), TransferWindow { offset: 5, length: 3 });
    }

    #[test]
    fn test_stale_if_range() {
        let mut headers = HeaderMap::new();
        headers.insert(RANGE, HeaderValue::from_static("bytes=50-60"));
        headers.insert(IF_RANGE, HeaderValue::from_static("\"old\""));
        let current = Validators {
            etag: Some("\"new\""),
            last_modified: None,
        };
        let plan = plan(
            &RequestView::new(&Method::GET, &headers),
            &SendOptions::default(),
            10,
            current,
        );
        // stale wins even over an unsatisfiable range
        assert_eq!(plan, RangePlan::FullBody { length: 10 });
    }

    #[test]
    fn test_empty_window_end() {
        let window = RangePlan::FullBody { length: 0 }.window(7);
        assert_eq!(window.end(), 7);
    }
}
