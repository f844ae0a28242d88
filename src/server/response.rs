//! Response construction
//!
//! All responses share one boxed body type so JSON, static files and event
//! streams can come out of the same router.

use std::convert::Infallible;

use bytes::Bytes;
use futures_util::StreamExt;
use http::header::{self, HeaderMap, HeaderValue};
use http::StatusCode;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Body type used for every response
pub type Body = BoxBody<Bytes, Infallible>;

/// HTTP response produced by the router
pub type Response = http::Response<Body>;

pub(crate) const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Add the permissive CORS headers used on every API response
pub fn apply_cors(headers: &mut HeaderMap, allow_headers: &'static str) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(allow_headers),
    );
}

/// Response with no body
pub fn empty(status: StatusCode) -> Response {
    let mut response = http::Response::new(Empty::<Bytes>::new().boxed());
    *response.status_mut() = status;
    response
}

/// Response with a fixed body
pub fn full(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response {
    let body: Bytes = body.into();
    let mut response = http::Response::new(Full::new(body).boxed());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// JSON response with CORS headers
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec_pretty(value) {
        Ok(body) => {
            let mut response = full(status, JSON_CONTENT_TYPE, body);
            apply_cors(response.headers_mut(), "Content-Type");
            response
        }
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// JSON error body `{success: false, error}` with CORS headers
pub fn error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({ "success": false, "error": message.into() });
    // A `json!` value always serializes
    let bytes = serde_json::to_vec(&body).unwrap_or_default();

    let mut response = full(status, JSON_CONTENT_TYPE, bytes);
    apply_cors(response.headers_mut(), "Content-Type");
    response
}

/// Empty `200` answering a CORS preflight
pub fn preflight() -> Response {
    let mut response = empty(StatusCode::OK);
    apply_cors(response.headers_mut(), "Content-Type");
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
    response
}

/// Streaming `text/event-stream` response fed by `rx`
pub fn event_stream(rx: mpsc::Receiver<Bytes>) -> Response {
    let stream = ReceiverStream::new(rx).map(|frame| Ok::<_, Infallible>(Frame::data(frame)));
    let mut response = http::Response::new(BodyExt::boxed(StreamBody::new(stream)));

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    apply_cors(headers, "Cache-Control");

    response
}
