//! Router config loader (strict parsing).
//!
//! `router-status.yaml` in the working directory is optional; when it is
//! absent the built-in demo apps are used. `ROUTER_STATUS_CONFIG` points at an
//! explicit file, which must then exist.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, StatusError};

pub const CONFIG_ENV: &str = "ROUTER_STATUS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "router-status.yaml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Tick of the SSE status stream.
    #[serde(default = "default_stream_interval_ms")]
    pub stream_interval_ms: u64,

    /// Tick of the requests-per-second sampler.
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    #[serde(default)]
    pub apps: Vec<AppRoute>,
}

/// A stub application served under `/apps/:name`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppRoute {
    pub name: String,

    /// Status every response of this app carries.
    #[serde(default = "default_status")]
    pub status: u16,

    /// Backend instances behind the route.
    #[serde(default = "default_backends")]
    pub backends: u32,

    /// Artificial backend latency.
    #[serde(default)]
    pub delay_ms: u64,

    /// Classification tags recorded with every response.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_stream_interval_ms() -> u64 {
    500
}
fn default_sample_interval_ms() -> u64 {
    1_000
}
fn default_status() -> u16 {
    200
}
fn default_backends() -> u32 {
    1
}

impl Default for RouterConfig {
    fn default() -> Self {
        let app = |name: &str, status: u16, backends: u32, delay_ms: u64, tags: [(&str, &str); 3]| {
            AppRoute {
                name: name.into(),
                status,
                backends,
                delay_ms,
                tags: tags
                    .into_iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect(),
            }
        };

        Self {
            listen: default_listen(),
            stream_interval_ms: default_stream_interval_ms(),
            sample_interval_ms: default_sample_interval_ms(),
            apps: vec![
                app(
                    "dora",
                    200,
                    2,
                    5,
                    [("component", "dea"), ("framework", "sinatra"), ("runtime", "ruby19")],
                ),
                app(
                    "api",
                    200,
                    3,
                    2,
                    [("component", "cloud_controller"), ("framework", "rails"), ("runtime", "ruby19")],
                ),
                app(
                    "legacy",
                    302,
                    1,
                    1,
                    [("component", "dea"), ("framework", "node"), ("runtime", "node08")],
                ),
                app(
                    "flaky",
                    502,
                    1,
                    20,
                    [("component", "dea"), ("framework", "spring"), ("runtime", "java7")],
                ),
            ],
        }
    }
}

impl RouterConfig {
    pub fn validate(&self) -> Result<()> {
        self.listen
            .parse::<SocketAddr>()
            .map_err(|e| StatusError::Config(format!("listen '{}': {e}", self.listen)))?;

        if self.stream_interval_ms == 0 {
            return Err(StatusError::Config("stream_interval_ms must be > 0".into()));
        }
        if self.sample_interval_ms == 0 {
            return Err(StatusError::Config("sample_interval_ms must be > 0".into()));
        }

        let mut seen = HashSet::new();
        for app in &self.apps {
            if app.name.is_empty() || app.name.contains('/') {
                return Err(StatusError::Config(format!("invalid app name '{}'", app.name)));
            }
            if !seen.insert(app.name.as_str()) {
                return Err(StatusError::Config(format!("duplicate app '{}'", app.name)));
            }
            if !(100..=999).contains(&app.status) {
                return Err(StatusError::Config(format!(
                    "app '{}': status {} out of range",
                    app.name, app.status
                )));
            }
        }
        Ok(())
    }

    /// Look up a stub app by name.
    pub fn app(&self, name: &str) -> Option<&AppRoute> {
        self.apps.iter().find(|a| a.name == name)
    }
}

/// Load from `ROUTER_STATUS_CONFIG`, else `router-status.yaml` if present,
/// else defaults.
pub fn load() -> Result<RouterConfig> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return load_from_file(&path);
    }
    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        return load_from_file(DEFAULT_CONFIG_PATH);
    }

    tracing::info!("no {DEFAULT_CONFIG_PATH} found, using built-in apps");
    let cfg = RouterConfig::default();
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_file(path: &str) -> Result<RouterConfig> {
    let s = fs::read_to_string(path)?;
    let cfg = load_from_str(&s)?;
    tracing::info!(path, apps = cfg.apps.len(), "loaded config");
    Ok(cfg)
}

pub fn load_from_str(s: &str) -> Result<RouterConfig> {
    let cfg: RouterConfig = serde_yaml::from_str(s)
        .map_err(|e| StatusError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
