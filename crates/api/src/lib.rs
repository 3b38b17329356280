//! MRC Serve HTTP surface.
//!
//! Exposes the [`pipeline::PipelineRegistry`] over JSON/HTTP:
//!
//! | Method & Path | Body | Response |
//! |---------------|------|----------|
//! | `GET /` | none | `{"hello": "world"}` |
//! | `GET /pipeline/` | none | `{"pipelines": [..]}` |
//! | `POST /pipeline/` | `{"model_name"}` | `{"model_name"}` or 404 |
//! | `POST /pipeline/analyze/` | `{"model_name","question","context"}` | `{"model_name","answer"}` or 404 |
//! | `GET /health` | none | status, version, pipeline count |
//!
//! Failures carry a `{"detail": ".."}` body.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Routing, JSON extraction, status codes, request
//! tracing and timeouts live here. Registry rules stay in [`pipeline`].

pub mod error;
pub mod handlers;
pub mod wire;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use pipeline::{PipelineRegistry, RequestId};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::ApiError;

/// Shared state accessible by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The registry every request reads or registers into.
    pub registry: Arc<PipelineRegistry>,
}

impl AppState {
    /// Wraps a registry for sharing across handlers.
    pub fn new(registry: Arc<PipelineRegistry>) -> Self {
        Self { registry }
    }
}

/// Build the router with all routes, request tracing and a per-request timeout.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(handlers::routes())
        .layer(middleware::from_fn(move |request: Request, next: Next| {
            enforce_timeout(request_timeout, request, next)
        }))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %RequestId::new_random(),
            )
        }))
        .with_state(state)
}

/// Answers with a `{"detail"}` body when the handler outlives `limit`.
async fn enforce_timeout(limit: Duration, request: Request, next: Next) -> Response {
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => ApiError::Timeout(limit).into_response(),
    }
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
