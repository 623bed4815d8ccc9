// Request handler module
// Dispatches GET/HEAD requests to the send pipeline through a hyper sink

use std::convert::Infallible;
use std::io;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, ALLOW, CONTENT_LENGTH};
use hyper::{Method, Request, Response, StatusCode};

use super::AppState;
use static_send::logger;
use static_send::transport::{HyperSink, RequestView, ResponseBody, ResponseSink};

/// Serve one request
///
/// The pipeline runs in its own local task and feeds the response body through
/// the sink channel; this future resolves as soon as the head is ready.
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if !is_supported(&method) {
        if state.config.logging.access_log {
            logger::log_access(
                &method,
                &path,
                StatusCode::METHOD_NOT_ALLOWED,
                0,
                started.elapsed(),
            );
        }
        return Ok(method_not_allowed());
    }

    let (sink, pending) = HyperSink::channel();
    let mut sink = match state.config.connection.write_stall_timeout() {
        Some(limit) => sink.with_write_timeout(limit),
        None => sink,
    };
    tokio::task::spawn_local(async move {
        let outcome = static_send::send(
            &state.store,
            RequestView::from(&req),
            &path,
            &state.config.send,
        )
        .deliver(&mut sink)
        .await;

        if state.config.logging.access_log {
            let status = outcome.status().unwrap_or_else(|| sink.status());
            logger::log_access(&method, &path, status, outcome.bytes(), started.elapsed());
        }
    });

    Ok(pending.into_response().await.unwrap_or_else(|_| {
        logger::log_error("Send pipeline ended without a response head");
        empty_response(StatusCode::INTERNAL_SERVER_ERROR)
    }))
}

fn is_supported(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

fn empty_response(status: StatusCode) -> Response<ResponseBody> {
    let body = Full::new(Bytes::new())
        .map_err(|never: Infallible| -> io::Error { match never {} })
        .boxed_unsync();
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
    response
}

/// 405 for anything but GET and HEAD
fn method_not_allowed() -> Response<ResponseBody> {
    let mut response = empty_response(StatusCode::METHOD_NOT_ALLOWED);
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_methods() {
        assert!(is_supported(&Method::GET));
        assert!(is_supported(&Method::HEAD));
        assert!(!is_supported(&Method::POST));
        assert!(!is_supported(&Method::OPTIONS));
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let response = method_not_allowed();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, HEAD");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }
}
