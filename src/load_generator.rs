use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::config::{AppRoute, RouterConfig};
use crate::metrics::StatusRegistry;

/// Pause between synthetic responses of one worker.
const WORKER_PACE: Duration = Duration::from_millis(1);

// ─── Public entry point ──────────────────────────────────────────

/// Spawns `concurrency` Tokio tasks that record synthetic responses until the
/// deadline or the `running` flag is set to false.
pub async fn run(
    running: Arc<AtomicBool>,
    registry: Arc<StatusRegistry>,
    config: Arc<RouterConfig>,
    concurrency: u32,
    duration_secs: u64,
) {
    let deadline = Instant::now() + Duration::from_secs(duration_secs);

    let mut handles = Vec::with_capacity(concurrency as usize);

    for worker_id in 0..concurrency {
        let running = running.clone();
        let registry = registry.clone();
        let config = config.clone();

        handles.push(tokio::spawn(async move {
            worker(worker_id, running, registry, config, deadline).await
        }));
    }

    let total = join_workers(handles).await;

    running.store(false, Ordering::SeqCst);
    tracing::info!(responses = total, "load generator finished");
}

/// Wait for every worker and sum what they sent. A failed worker is logged
/// and contributes nothing.
async fn join_workers(handles: Vec<JoinHandle<u64>>) -> u64 {
    let mut total = 0u64;
    for h in handles {
        match h.await {
            Ok(sent) => total += sent,
            Err(e) => tracing::warn!(error = %e, "load worker failed"),
        }
    }
    total
}

// ─── Worker loop ─────────────────────────────────────────────────

async fn worker(
    id: u32,
    running: Arc<AtomicBool>,
    registry: Arc<StatusRegistry>,
    config: Arc<RouterConfig>,
    deadline: Instant,
) -> u64 {
    // Each worker gets its own deterministic RNG seeded uniquely.
    let mut rng = StdRng::seed_from_u64(1000 + id as u64);
    let mut sent = 0u64;

    while running.load(Ordering::Relaxed) && Instant::now() < deadline {
        let app = if config.apps.is_empty() {
            None
        } else {
            Some(&config.apps[rng.gen_range(0..config.apps.len())])
        };

        let (status, latency) = synthetic_response(&mut rng, app);
        match app {
            Some(app) => registry.record_response(status, latency, &app.tags),
            None => registry.record_response(status, latency, std::iter::empty::<(&str, &str)>()),
        }
        sent += 1;

        tokio::time::sleep(WORKER_PACE).await;
    }

    sent
}

// ─── Response synthesis ──────────────────────────────────────────

/// Mostly the app's own status, with a sprinkling of gateway errors; latency
/// jitters around the app's delay.
fn synthetic_response(rng: &mut StdRng, app: Option<&AppRoute>) -> (i32, i64) {
    let (status, delay) = app
        .map(|a| (i32::from(a.status), a.delay_ms as i64))
        .unwrap_or((200, 0));

    let status = if rng.gen_bool(0.05) {
        [500, 502, 503, 504][rng.gen_range(0..4)]
    } else {
        status
    };
    let latency = delay + rng.gen_range(0..=25);

    (status, latency)
}
