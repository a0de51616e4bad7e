//! Mock REST gateway for TalentFlow: axum routes over the local store, with synthetic
//! latency and injected write failures.

pub mod assessments;
pub mod candidates;
pub mod error;
pub mod faults;
pub mod jobs;
pub mod listing;
pub mod transport;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post};
use axum::Router;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tflow_client::API_NAMESPACE;
use tflow_seed::{ensure_seeded, SeedOutcome};
use tflow_storage::Store;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub use crate::error::ApiError;
pub use crate::faults::FaultPolicy;
pub use crate::transport::GatewayTransport;

pub const CRATE_NAME: &str = "tflow-gateway";

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Store,
    pub faults: Arc<FaultPolicy>,
}

impl AppState {
    pub fn new(store: Store, faults: FaultPolicy) -> Self {
        Self {
            store,
            faults: Arc::new(faults),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let state = Arc::new(state);
    let api = Router::new()
        .route("/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route("/jobs/{id}", patch(jobs::update_job))
        .route("/jobs/{id}/reorder", patch(jobs::reorder_job))
        .route(
            "/candidates",
            get(candidates::list_candidates).post(candidates::create_candidate),
        )
        .route("/candidates/{id}", patch(candidates::update_candidate))
        .route("/candidates/{id}/timeline", get(candidates::candidate_timeline))
        .route(
            "/assessments/{job_id}",
            get(assessments::get_assessment).put(assessments::put_assessment),
        )
        .route("/assessments/{job_id}/submit", post(assessments::submit_assessment))
        .layer(from_fn_with_state(state.clone(), faults::synthetic_latency));

    Router::new()
        .nest(API_NAMESPACE, api)
        .fallback(route_not_found)
        .with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError::not_found()
}

/// Shallow JSON merge of `patch` onto `current`. Null removes a field; protected keys are ignored.
pub(crate) fn merge_patch<T>(
    current: &T,
    patch: &Map<String, JsonValue>,
    protected: &[&str],
) -> Result<T, ApiError>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = match serde_json::to_value(current)? {
        JsonValue::Object(map) => map,
        _ => return Err(ApiError::Internal("record is not a JSON object".to_string())),
    };
    for (key, value) in patch {
        if protected.contains(&key.as_str()) {
            continue;
        }
        if value.is_null() {
            merged.remove(key);
        } else {
            merged.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(JsonValue::Object(merged))
        .map_err(|err| ApiError::Validation(format!("invalid patch: {err}")))
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub faults_enabled: bool,
    pub failure_rate: f64,
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            db_path: PathBuf::from("./talentflow-db.json"),
            faults_enabled: true,
            failure_rate: faults::DEFAULT_FAILURE_RATE,
            latency_min_ms: faults::DEFAULT_LATENCY.start.as_millis() as u64,
            latency_max_ms: faults::DEFAULT_LATENCY.end.as_millis() as u64,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parsed("TFLOW_PORT").unwrap_or(defaults.port),
            db_path: std::env::var("TFLOW_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            faults_enabled: std::env::var("TFLOW_FAULTS_ENABLED")
                .map(|v| !matches!(v.trim(), "0" | "false" | "FALSE" | "False"))
                .unwrap_or(defaults.faults_enabled),
            failure_rate: env_parsed("TFLOW_FAILURE_RATE").unwrap_or(defaults.failure_rate),
            latency_min_ms: env_parsed("TFLOW_LATENCY_MIN_MS").unwrap_or(defaults.latency_min_ms),
            latency_max_ms: env_parsed("TFLOW_LATENCY_MAX_MS").unwrap_or(defaults.latency_max_ms),
        }
    }

    pub fn fault_policy(&self) -> FaultPolicy {
        if !self.faults_enabled {
            return FaultPolicy::disabled();
        }
        let latency =
            Duration::from_millis(self.latency_min_ms)..Duration::from_millis(self.latency_max_ms);
        if latency.is_empty() {
            warn!(
                min_ms = self.latency_min_ms,
                max_ms = self.latency_max_ms,
                "latency range is empty; requests will not be delayed"
            );
        }
        FaultPolicy::new(Some(latency), self.failure_rate, StdRng::from_entropy())
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Open and seed the store, then serve the API until ctrl-c.
pub async fn serve(config: GatewayConfig) -> anyhow::Result<()> {
    let store = Store::open(&config.db_path)
        .await
        .with_context(|| format!("opening store at {}", config.db_path.display()))?;
    let outcome = ensure_seeded(&store, &mut StdRng::from_entropy())
        .await
        .context("seeding store")?;
    if let SeedOutcome::Seeded(summary) = outcome {
        info!(?summary, "store seeded on startup");
    }

    let state = AppState::new(store.clone(), config.fault_policy());
    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding port {}", config.port))?;
    info!(
        addr = %listener.local_addr()?,
        db = %config.db_path.display(),
        faults = config.faults_enabled,
        "gateway listening"
    );
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await?;
    info!("gateway stopped");
    Ok(())
}

pub async fn serve_from_env() -> anyhow::Result<()> {
    serve(GatewayConfig::from_env()).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
}
