//! Synthetic latency and write-failure injection, defined once for every route.

use std::ops::Range;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tflow_storage::Database;
use tracing::{debug, info_span, warn, Instrument};

use crate::error::ApiError;
use crate::AppState;

pub const DEFAULT_FAILURE_RATE: f64 = 0.07;
pub const DEFAULT_LATENCY: Range<Duration> =
    Duration::from_millis(200)..Duration::from_millis(1200);

/// Latency distribution and failure probability applied to gateway requests.
#[derive(Debug)]
pub struct FaultPolicy {
    latency: Option<Range<Duration>>,
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl FaultPolicy {
    pub fn new(latency: Option<Range<Duration>>, failure_rate: f64, rng: StdRng) -> Self {
        Self {
            latency,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
        }
    }

    /// No delay and no injected failures.
    pub fn disabled() -> Self {
        Self::new(None, 0.0, StdRng::seed_from_u64(0))
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    /// Delay for one request, uniform over the configured half-open range.
    pub fn sample_latency(&self) -> Duration {
        match &self.latency {
            Some(range) if !range.is_empty() => self.with_rng(|rng| rng.gen_range(range.clone())),
            _ => Duration::ZERO,
        }
    }

    pub fn roll_failure(&self) -> bool {
        self.failure_rate > 0.0 && self.with_rng(|rng| rng.gen_bool(self.failure_rate))
    }

    /// Gate for an already-validated write.
    pub fn admit_write(&self) -> Result<(), ApiError> {
        if self.roll_failure() {
            warn!(failure_rate = self.failure_rate, "injecting transient write failure");
            return Err(ApiError::Transient("Random failure".to_string()));
        }
        Ok(())
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

/// Run a validated mutation: roll the injected failure, then commit atomically.
pub async fn commit_write<R>(
    state: &AppState,
    commit: impl FnOnce(&mut Database) -> Result<R, ApiError>,
) -> Result<R, ApiError> {
    state.faults.admit_write()?;
    state.store.transaction(commit).await
}

/// Middleware delaying every routed request before it is handled.
pub async fn synthetic_latency(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let span = info_span!("api_request", method = %req.method(), path = %req.uri().path());
    async move {
        let started = Instant::now();
        let delay = state.faults.sample_latency();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let resp = next.run(req).await;
        debug!(
            status = resp.status().as_u16(),
            delay_ms = delay.as_millis() as u64,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request handled"
        );
        resp
    }
    .instrument(span)
    .await
}
