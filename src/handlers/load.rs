use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LoadConfig {
    /// Number of concurrent Tokio tasks generating traffic
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// How long the generator runs (seconds)
    #[serde(default = "default_duration")]
    pub duration_secs: u64,
}

fn default_concurrency() -> u32 {
    10
}
fn default_duration() -> u64 {
    30
}

/// One generator run. The flag belongs to this run only, so a finishing run
/// can never clear the flag of its successor.
pub struct LoadRun {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl LoadRun {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.handle.is_finished()
    }

    /// Signal the workers and wait until the run has fully stopped.
    async fn stop(self) {
        self.running.store(false, Ordering::SeqCst);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "load generator task failed");
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoadStatus {
    pub running: bool,
    pub message: String,
}

// ─── POST /api/load/start ────────────────────────────────────────

pub async fn start_load(
    State(state): State<Arc<AppState>>,
    Json(config): Json<LoadConfig>,
) -> Result<Json<LoadStatus>, AppError> {
    if config.concurrency == 0 || config.concurrency > 500 {
        return Err(AppError::BadRequest(
            "concurrency must be between 1 and 500".into(),
        ));
    }
    if config.duration_secs == 0 || config.duration_secs > 300 {
        return Err(AppError::BadRequest(
            "duration_secs must be between 1 and 300".into(),
        ));
    }

    // Held until the new run is stored: start and stop never interleave
    let mut guard = state.load.lock().await;
    if guard.as_ref().is_some_and(LoadRun::is_running) {
        return Err(AppError::AlreadyRunning);
    }

    let msg = format!(
        "Started: {} workers × {}s",
        config.concurrency, config.duration_secs,
    );
    tracing::info!(
        concurrency = config.concurrency,
        duration_secs = config.duration_secs,
        "load generator started"
    );

    let running = Arc::new(AtomicBool::new(true));
    let handle = tokio::spawn(crate::load_generator::run(
        running.clone(),
        state.registry.clone(),
        state.config.clone(),
        config.concurrency,
        config.duration_secs,
    ));
    *guard = Some(LoadRun { running, handle });

    Ok(Json(LoadStatus {
        running: true,
        message: msg,
    }))
}

// ─── POST /api/load/stop ─────────────────────────────────────────

pub async fn stop_load(State(state): State<Arc<AppState>>) -> Json<LoadStatus> {
    let mut guard = state.load.lock().await;
    let Some(run) = guard.take() else {
        return Json(LoadStatus {
            running: false,
            message: "No load generator is running".into(),
        });
    };

    let was_running = run.is_running();
    run.stop().await;

    Json(LoadStatus {
        running: false,
        message: if was_running {
            "Load generator stopped".into()
        } else {
            "No load generator is running".into()
        },
    })
}

// ─── GET /api/load/status ────────────────────────────────────────

pub async fn load_status(State(state): State<Arc<AppState>>) -> Json<LoadStatus> {
    let running = state
        .load
        .lock()
        .await
        .as_ref()
        .is_some_and(LoadRun::is_running);
    Json(LoadStatus {
        running,
        message: if running {
            "Load generator running".into()
        } else {
            "Idle".into()
        },
    })
}
