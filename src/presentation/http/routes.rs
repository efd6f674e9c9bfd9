//! Route Configuration
//!
//! Configures all HTTP routes, the gateway upgrade and static media.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::auth_middleware;
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    let media = &state.settings.media;
    let public_prefix = media.public_prefix.trim_end_matches('/').to_string();
    let static_media = ServeDir::new(&media.storage_path);

    Router::new()
        .nest("/api", api_routes(state.clone()))
        // WebSocket gateway endpoint; authenticates before upgrading
        .route("/gateway", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        // Uploaded files, by the reference stored in media messages
        .nest_service(&public_prefix, static_media)
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API routes (protected)
fn api_routes(state: AppState) -> Router<AppState> {
    let body_limit = state.settings.media.max_upload_size + MULTIPART_OVERHEAD;

    Router::new()
        .route(
            "/channels/{channel_id}/media",
            post(handlers::media::upload_media),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
