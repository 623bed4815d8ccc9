//! HTTP response building module
//!
//! Minimal HTML error and redirect documents, written straight into a
//! response sink. Both carry a locked-down CSP and `nosniff`.

use super::header_value;
use crate::error::{SendError, SinkError};
use crate::transport::ResponseSink;
use bytes::Bytes;
use hyper::header::{
    HeaderValue, CONTENT_LENGTH, CONTENT_SECURITY_POLICY, CONTENT_TYPE, LOCATION,
    X_CONTENT_TYPE_OPTIONS,
};
use hyper::StatusCode;
use std::fmt::Write;

const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";
const DOCUMENT_CSP: &str = "default-src 'none'";

/// Build the minimal HTML document used for errors and redirects
pub fn create_html_document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<pre>{body}</pre>\n</body>\n</html>\n"
    )
}

/// Escape the five HTML-significant characters
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Percent-encode everything that may not appear raw in a URL
///
/// Existing, well-formed `%XX` escapes are preserved; a `%` that does not start
/// one is encoded as `%25`.
pub fn encode_url(url: &str) -> String {
    let bytes = url.as_bytes();
    let mut out = String::with_capacity(url.len());
    for (i, &b) in bytes.iter().enumerate() {
        let keep = match b {
            b'%' => bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)),
            0x21 | 0x23..=0x3B | 0x3D | 0x3F..=0x5F | 0x61..=0x7A | 0x7C | 0x7E => true,
            _ => false,
        };
        if keep {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

/// Collapse a run of leading slashes into one
///
/// Keeps a redirect target from turning into a protocol-relative URL.
pub fn collapse_leading_slashes(s: &str) -> String {
    let trimmed = s.trim_start_matches('/');
    if s.len() - trimmed.len() > 1 {
        format!("/{trimmed}")
    } else {
        s.to_string()
    }
}

fn set_document_headers<R: ResponseSink + ?Sized>(sink: &mut R, doc: &str) {
    sink.set_header(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    sink.set_header(CONTENT_LENGTH, HeaderValue::from(doc.len()));
    sink.set_header(
        CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(DOCUMENT_CSP),
    );
    sink.set_header(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
}

/// Render the error document
///
/// Every header set so far is discarded first; status-specific headers from
/// the error (e.g. `Content-Range` on 416) are applied afterwards. With
/// `head_only` the headers describe the document but no body is written.
pub async fn send_error<R: ResponseSink + ?Sized>(
    sink: &mut R,
    err: &SendError,
    head_only: bool,
) -> Result<(), SinkError> {
    let status = err.status();
    let message = status.canonical_reason().unwrap_or_else(|| status.as_str());
    let doc = create_html_document("Error", &escape_html(message));

    sink.headers_mut().clear();
    for (name, value) in &err.headers() {
        sink.set_header(name.clone(), value.clone());
    }
    sink.set_status(status);
    set_document_headers(sink, &doc);
    end_document(sink, doc, head_only).await
}

/// Render a 301 redirect document pointing at `target`
///
/// Returns the `Location` value that was sent.
pub async fn send_redirect<R: ResponseSink + ?Sized>(
    sink: &mut R,
    target: &str,
    head_only: bool,
) -> Result<String, SinkError> {
    let location = encode_url(&collapse_leading_slashes(target));
    let doc = create_html_document(
        "Redirecting",
        &format!("Redirecting to {}", escape_html(&location)),
    );

    sink.set_status(StatusCode::MOVED_PERMANENTLY);
    set_document_headers(sink, &doc);
    sink.set_header(LOCATION, header_value(location.clone()));
    end_document(sink, doc, head_only).await?;
    Ok(location)
}

async fn end_document<R: ResponseSink + ?Sized>(
    sink: &mut R,
    doc: String,
    head_only: bool,
) -> Result<(), SinkError> {
    if head_only {
        sink.end(None).await
    } else {
        sink.end(Some(Bytes::from(doc))).await
    }
}
