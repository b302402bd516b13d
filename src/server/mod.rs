//! HTTP surface: `POST /analyze_image` and `GET /health`.
//!
//! The router only does I/O plumbing. It pulls the `image` part out of the
//! multipart body, stages it with [`upload::StagedUpload`], hands the path to
//! the shared [`Extractor`] and maps the outcome onto a status code. Every
//! error body has the shape `{"error": "<message>"}`.

mod handlers;
pub mod upload;

use crate::error::{AttemptError, ExtractionError, ListingError};
use crate::extract::Extractor;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Settings for the HTTP layer.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address. Default: `127.0.0.1:5000`.
    pub bind_addr: SocketAddr,
    /// Directory holding per-request upload folders. Default: `uploads`.
    pub upload_dir: PathBuf,
    /// Largest accepted request body in bytes. Default: 16 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<Extractor>,
    pub upload_dir: Arc<PathBuf>,
}

/// JSON error response: `{"error": message}` with `status`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(error: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ListingError> for ApiError {
    fn from(e: ListingError) -> Self {
        tracing::error!(error = %e, "request failed outside the extraction loop");
        Self::internal(e)
    }
}

impl From<ExtractionError> for ApiError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::Image(inner) => inner.into(),
            ExtractionError::Exhausted { ref last, .. } => {
                let status = match last {
                    AttemptError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::BAD_GATEWAY,
                };
                Self::new(status, e.to_string())
            }
        }
    }
}

/// Build the application router.
pub fn build_app(extractor: Arc<Extractor>, config: &ServerConfig) -> Router {
    let state = AppState {
        extractor,
        upload_dir: Arc::new(config.upload_dir.clone()),
    };

    Router::new()
        .route("/analyze_image", post(handlers::analyze_image))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_parse_maps_to_bad_gateway() {
        let e = ExtractionError::Exhausted {
            attempts: 2,
            last: AttemptError::Parse {
                message: "eof".into(),
            },
        };
        let api: ApiError = e.into();
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
        assert_eq!(api.message, "Invalid JSON output: eof");
    }

    #[test]
    fn exhausted_timeout_maps_to_gateway_timeout() {
        let e = ExtractionError::Exhausted {
            attempts: 2,
            last: AttemptError::Timeout { elapsed_ms: 60_000 },
        };
        assert_eq!(ApiError::from(e).status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn image_error_maps_to_internal() {
        let e = ExtractionError::Image(ListingError::Internal("boom".into()));
        let api = ApiError::from(e);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Internal error: boom");
    }

    #[test]
    fn default_server_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr.port(), 5000);
        assert_eq!(c.upload_dir, PathBuf::from("uploads"));
    }
}
