use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use super::registry::StatusSnapshot;
use crate::AppState;

// ─── GET /api/status ─────────────────────────────────────────────
/// Returns a single JSON snapshot of the registry.

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusSnapshot> {
    Json(state.registry.snapshot())
}

// ─── GET /api/status/stream ──────────────────────────────────────
/// Server-Sent Events endpoint.
/// Pushes a full `StatusSnapshot` as JSON every `stream_interval_ms`.

pub async fn status_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval =
        tokio::time::interval(Duration::from_millis(state.config.stream_interval_ms));

    let stream = IntervalStream::new(interval).map(move |_| {
        let snapshot = state.registry.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "status snapshot did not serialize");
            String::new()
        });
        Ok(Event::default().data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
