//! Request routing
//!
//! Maps method and path onto the sync engine, the event stream, or the
//! static file directory. Failures are turned into responses here and never
//! propagate further up.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::header::{self, HeaderValue};
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use serde_json::json;

use super::response::{self, Response, ALLOW_METHODS};
use super::static_files::StaticFiles;
use crate::document::{last_updated, parse_document, Document};
use crate::error::{is_hyper_disconnect, Error, ErrorKind, Result};
use crate::session::EventSession;
use crate::sync::SyncEngine;

/// Route a request resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `GET /api/data`
    ReadData,
    /// `POST /api/data`
    WriteData,
    /// `GET /api/events`
    Events,
    /// `GET /api/health`
    Health,
    /// `OPTIONS` on any path
    Preflight,
    /// `GET`/`HEAD` outside the API
    Static,
    /// Known method, unknown path
    NotFound,
    /// Method the server does not handle
    MethodNotAllowed,
}

impl Route {
    /// Resolve a method and path
    pub fn resolve(method: &Method, path: &str) -> Route {
        let api = match path.trim_end_matches('/') {
            "/api/data" => Some(Route::ReadData),
            "/api/events" => Some(Route::Events),
            "/api/health" => Some(Route::Health),
            _ => None,
        };

        match *method {
            Method::OPTIONS => Route::Preflight,
            Method::GET => api.unwrap_or(Route::Static),
            Method::HEAD => Route::Static,
            Method::POST if api == Some(Route::ReadData) => Route::WriteData,
            Method::POST => Route::NotFound,
            _ => Route::MethodNotAllowed,
        }
    }
}

/// Dispatches requests for one server
pub struct Router {
    engine: Arc<SyncEngine>,
    static_files: StaticFiles,
    max_body_size: usize,
}

impl Router {
    /// Create a router
    pub fn new(engine: Arc<SyncEngine>, static_files: StaticFiles, max_body_size: usize) -> Self {
        Self {
            engine,
            static_files,
            max_body_size,
        }
    }

    /// The engine requests are routed to
    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Handle one request
    pub async fn handle<B>(&self, req: Request<B>, peer_addr: SocketAddr) -> Response
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let start = Instant::now();

        let response = match Route::resolve(&method, &path) {
            Route::ReadData => self.read_data().await,
            Route::WriteData => self.write_data(req.into_body(), peer_addr).await,
            Route::Events => self.open_events(peer_addr).await,
            Route::Health => self.health().await,
            Route::Preflight => response::preflight(),
            Route::Static => self.static_files.serve(&path, method == Method::HEAD).await,
            Route::NotFound => response::error(
                StatusCode::NOT_FOUND,
                format!("No route found for {} {}", method, path),
            ),
            Route::MethodNotAllowed => {
                let mut response = response::error(
                    StatusCode::METHOD_NOT_ALLOWED,
                    format!("Method {} not allowed", method),
                );
                response
                    .headers_mut()
                    .insert(header::ALLOW, HeaderValue::from_static(ALLOW_METHODS));
                response
            }
        };

        log_request(&method, &path, response.status(), start);
        response
    }

    async fn read_data(&self) -> Response {
        match self.engine.read().await {
            Ok(document) => response::json(StatusCode::OK, &document),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read document");
                response::error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Server error: {}", e),
                )
            }
        }
    }

    async fn write_data<B>(&self, body: B, peer_addr: SocketAddr) -> Response
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        match self.save(body).await {
            Ok(document) => response::json(
                StatusCode::OK,
                &json!({
                    "success": true,
                    "message": "data saved",
                    "timestamp": last_updated(&document),
                }),
            ),
            Err(e) => {
                match e.kind() {
                    ErrorKind::Disconnect => {
                        tracing::debug!(peer = %peer_addr, "Client disconnected during upload")
                    }
                    ErrorKind::MalformedInput => {
                        tracing::warn!(peer = %peer_addr, error = %e, "Rejected document")
                    }
                    ErrorKind::Storage | ErrorKind::Internal => {
                        tracing::error!(peer = %peer_addr, error = %e, "Failed to save document")
                    }
                }
                response::error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Save failed: {}", e),
                )
            }
        }
    }

    async fn save<B>(&self, body: B) -> Result<Document>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let bytes = read_body(body, self.max_body_size).await?;
        let candidate = parse_document(&bytes)?;
        self.engine.update(candidate).await
    }

    async fn open_events(&self, peer_addr: SocketAddr) -> Response {
        let rx = EventSession::start(Arc::clone(&self.engine), peer_addr).await;
        response::event_stream(rx)
    }

    async fn health(&self) -> Response {
        let stats = self.engine.stats().snapshot();
        let subscribers = self.engine.registry().len().await;
        response::json(
            StatusCode::OK,
            &json!({
                "status": "ok",
                "subscribers": subscribers,
                "writes": stats.writes,
                "uptimeSecs": stats.uptime.as_secs(),
            }),
        )
    }
}

/// Collect a request body up to `limit` bytes
async fn read_body<B>(body: B, limit: usize) -> Result<Bytes>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) => {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                return Err(Error::malformed(format!(
                    "request body exceeds {} bytes",
                    limit
                )));
            }
            if let Some(hyper_err) = e.downcast_ref::<hyper::Error>() {
                if is_hyper_disconnect(hyper_err) {
                    return Err(Error::Disconnected);
                }
            }
            Err(Error::malformed(e))
        }
    }
}

/// Log request completion
fn log_request(method: &Method, path: &str, status: StatusCode, start: Instant) {
    let elapsed = start.elapsed();

    if status.is_success() {
        tracing::info!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request completed"
        );
    } else {
        tracing::warn!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request failed"
        );
    }
}
