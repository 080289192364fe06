use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

use crate::AppState;

/// Times every `/apps/:name` request and feeds the outcome to the registry.
///
/// Known apps are recorded with their status, wall time in milliseconds and
/// classification tags. Requests for unknown apps never reach a backend, so
/// they are only counted as raw traffic.
///
/// Also adds two response headers:
///
///   x-response-time-ms: recorded latency
///   server-timing: same value in the standard Server-Timing format
pub async fn record_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let app = path
        .strip_prefix("/apps/")
        .and_then(|name| state.config.app(name));

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    let latency_ms = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
    let status = response.status().as_u16();

    match app {
        Some(app) => {
            state
                .registry
                .record_response(i32::from(status), latency_ms, &app.tags)
        }
        None => state.registry.inc_requests(),
    }

    // ── Inject response headers ─────────────────────────────────
    if let Ok(val) = latency_ms.to_string().parse() {
        response.headers_mut().insert("x-response-time-ms", val);
    }

    let server_timing = format!("total;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = server_timing.parse() {
        response.headers_mut().insert("server-timing", val);
    }

    tracing::debug!(%method, %path, status, latency_ms, known = app.is_some(), "request");

    response
}
