//! HTTP front-end.
//!
//! Routes:
//! - `GET /api/status` runs one poll and returns the free slots
//! - `GET /health` liveness check
//! - `GET /` and `GET /static/*path` serve the embedded status page
//!
//! The request timeout covers the page, asset and health routes only. A poll
//! runs on its own task with bounded fetches and send, and always answers 200.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rust_embed::RustEmbed;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::monitor::{Monitor, StatusResponse};
use crate::signals::ShutdownSignal;

#[derive(RustEmbed)]
#[folder = "static/"]
struct StaticAssets;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    monitor: Arc<Monitor>,
}

/// Builds the router.
pub fn router(monitor: Arc<Monitor>, config: &ServerConfig) -> Router {
    let pages = Router::new()
        .route("/", get(index))
        .route("/static/*path", get(static_asset))
        .route("/health", get(health))
        .layer(TimeoutLayer::new(config.request_timeout));

    Router::new()
        .route("/api/status", get(status))
        .merge(pages)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { monitor })
}

/// Binds the configured address and serves until `shutdown` fires.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(
    monitor: Arc<Monitor>,
    config: &ServerConfig,
    shutdown: ShutdownSignal,
) -> ServerResult<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|e| ServerError::bind(config.bind, e))?;
    info!(addr = %config.bind, "Listening");

    axum::serve(listener, router(monitor, config))
        .with_graceful_shutdown(shutdown.wait())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let report = state.monitor.poll_detached().await;
    Json(report.status())
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn index() -> Response {
    serve_asset("index.html")
}

async fn static_asset(Path(path): Path<String>) -> Response {
    serve_asset(path.trim_start_matches('/'))
}

fn serve_asset(path: &str) -> Response {
    match StaticAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}
