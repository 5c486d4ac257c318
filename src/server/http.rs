//! HTTP surface over [`LookupService`].
//!
//! Thin axum handlers: parse the request, call the service, map
//! [`HuginnError`] to a status code and a JSON error body.

use std::future::Future;
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::{HeaderName, HeaderValue, RETRY_AFTER};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::HuginnError;
use crate::service::LookupService;
use crate::version::{BuildInfo, version_string};

const SERVICE_NAME: &str = "huginn";
const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

type AppState = Arc<LookupService>;

/// Error response: `{"error": kind, "detail": message, "retryAfterSecs"?}`.
pub struct ApiError(pub HuginnError);

impl From<HuginnError> for ApiError {
    fn from(err: HuginnError) -> Self {
        Self(err)
    }
}

/// HTTP status for each error kind.
pub fn status_for(err: &HuginnError) -> StatusCode {
    match err {
        HuginnError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        HuginnError::Private(_) => StatusCode::FORBIDDEN,
        HuginnError::NotFound(_) => StatusCode::NOT_FOUND,
        HuginnError::CopyrightRestricted(_) => StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS,
        HuginnError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        HuginnError::TemporarilyBlocked { .. } | HuginnError::ShuttingDown => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        HuginnError::Extraction(_)
        | HuginnError::Json(_)
        | HuginnError::Configuration(_)
        | HuginnError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() && !self.0.is_transient() {
            error!(kind = self.0.kind(), error = %self.0, "request failed");
        }

        let retry_after = self.0.retry_after().map(|d| d.as_secs());
        let mut body = json!({
            "error": self.0.kind(),
            "detail": self.0.to_string(),
        });
        if let Some(secs) = retry_after {
            body["retryAfterSecs"] = json!(secs);
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

fn cache_header(cached: bool) -> [(HeaderName, HeaderValue); 1] {
    let value = if cached { "HIT" } else { "MISS" };
    [(X_CACHE, HeaderValue::from_static(value))]
}

async fn index() -> impl IntoResponse {
    Json(json!({
        "service": SERVICE_NAME,
        "version": version_string(),
        "endpoints": [
            "GET /health",
            "GET /search?q=<query>&limit=<n>",
            "GET /stream/{item_id}",
            "GET /streamvideo/{item_id}",
            "GET /stats",
            "GET /cache/stats",
            "POST /cache/clear",
        ],
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": version_string(),
        "build": BuildInfo::current(),
    }))
}

async fn search(
    State(service): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) =
        params.map_err(|e| HuginnError::InvalidArgument(e.body_text()))?;
    let result = service.search(&params.q, params.limit).await?;
    Ok((cache_header(result.cached), Json(result.value)).into_response())
}

async fn audio_stream(
    State(service): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Response, ApiError> {
    let result = service.resolve_audio_stream(&item_id).await?;
    Ok((cache_header(result.cached), Json(result)).into_response())
}

async fn video_stream(
    State(service): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Response, ApiError> {
    let result = service.resolve_video_stream(&item_id).await?;
    Ok((cache_header(result.cached), Json(result)).into_response())
}

async fn clear_cache(State(service): State<AppState>) -> impl IntoResponse {
    service.clear_cache();
    Json(json!({ "status": "cleared" }))
}

async fn stats(State(service): State<AppState>) -> impl IntoResponse {
    Json(service.service_stats())
}

async fn cache_stats(State(service): State<AppState>) -> impl IntoResponse {
    Json(service.cache_stats())
}

/// Build the router. CORS is open to any origin.
pub fn router(service: Arc<LookupService>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/search", get(search))
        .route("/stream/:item_id", get(audio_stream))
        .route("/streamvideo/:item_id", get(video_stream))
        .route("/cache/clear", post(clear_cache))
        .route("/clear_cache", get(clear_cache))
        .route("/stats", get(stats))
        .route("/cache/stats", get(cache_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Serve the router on `listener` until `shutdown` resolves, then let
/// in-flight requests finish.
pub async fn serve<F>(
    listener: TcpListener,
    service: Arc<LookupService>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}
