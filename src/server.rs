use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::metrics::stream;
use crate::middleware::recording;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    // ── Stub app routes, recorded into the registry ─────────────
    let apps = Router::new()
        .route("/apps/:name", get(handlers::apps::serve_app))
        .route_layer(axum_mw::from_fn_with_state(
            state.clone(),
            recording::record_middleware,
        ));

    Router::new()
        .merge(apps)
        // ── Load generator control ──────────────────────────────
        .route("/api/load/start", post(handlers::load::start_load))
        .route("/api/load/stop", post(handlers::load::stop_load))
        .route("/api/load/status", get(handlers::load::load_status))
        // ── Status ──────────────────────────────────────────────
        .route("/api/status", get(stream::get_status))
        .route("/api/status/stream", get(stream::status_stream))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        .layer(CorsLayer::permissive())
}
