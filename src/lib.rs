//! Request metrics for an HTTP router.
//!
//! [`metrics::StatusRegistry`] aggregates response classes and latency
//! distributions overall and per classification tag. The remaining modules
//! wire it into a small axum service that records stub app traffic and serves
//! the status document.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handlers;
pub mod load_generator;
pub mod metrics;
pub mod middleware;
pub mod server;

use config::RouterConfig;
use metrics::StatusRegistry;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// The one registry of this process; handlers record, status routes read.
    pub registry: Arc<StatusRegistry>,

    pub config: Arc<RouterConfig>,

    /// Current load-generator run, if any, so we can await clean shutdown.
    pub load: tokio::sync::Mutex<Option<handlers::load::LoadRun>>,
}

impl AppState {
    /// Build the registry and register every configured app with it.
    pub fn new(config: RouterConfig) -> Self {
        let registry = Arc::new(StatusRegistry::new());
        handlers::apps::register(&registry, &config.apps);

        Self {
            registry,
            config: Arc::new(config),
            load: tokio::sync::Mutex::new(None),
        }
    }
}
