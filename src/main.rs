use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use router_status::metrics::sampler;
use router_status::{config, server, AppState};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── 1. Load config ───────────────────────────────────────────
    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "config load failed");
            std::process::exit(1);
        }
    };

    // ── 2. Build shared state ────────────────────────────────────
    let state = Arc::new(AppState::new(cfg));

    // ── 3. Requests-per-second sampler ───────────────────────────
    tokio::spawn(sampler::run(
        state.registry.clone(),
        Duration::from_millis(state.config.sample_interval_ms),
    ));

    // ── 4. Build Axum router ─────────────────────────────────────
    let listen = state.config.listen.clone();
    let app = server::create_router(state);

    // ── 5. Bind & serve ──────────────────────────────────────────
    let listener = match tokio::net::TcpListener::bind(&listen).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%listen, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(%listen, "router-status listening");
    tracing::info!("status json   → /api/status");
    tracing::info!("status stream → /api/status/stream");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
