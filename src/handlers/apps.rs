use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppRoute;
use crate::metrics::StatusRegistry;
use crate::AppState;

use super::AppError;

/// Count every configured app as one url and its backends as instances.
pub fn register(registry: &StatusRegistry, apps: &[AppRoute]) {
    for app in apps {
        registry.inc_urls();
        for _ in 0..app.backends {
            registry.inc_backends();
        }
        tracing::debug!(app = %app.name, backends = app.backends, "registered app");
    }
}

// ─── GET /apps/:name ─────────────────────────────────────────────
/// Stand-in for a proxied backend: answers with the app's configured status
/// after its configured delay.

pub async fn serve_app(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let app = state
        .config
        .app(&name)
        .ok_or_else(|| AppError::NotFound(format!("app '{name}' not found")))?;

    if app.delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(app.delay_ms)).await;
    }

    // validated at config load
    let status = StatusCode::from_u16(app.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::json!({
        "app":    app.name,
        "status": app.status,
    });

    Ok((status, Json(body)).into_response())
}
