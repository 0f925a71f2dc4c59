//! Liveness, readiness and metrics endpoints
//!
//! ```yaml
//! livenessProbe:
//!   httpGet:
//!     path: /health/live
//!     port: 8080
//! readinessProbe:
//!   httpGet:
//!     path: /health/ready
//!     port: 8080
//! ```
//!
//! `GET /` answers with a plain-text banner for uptime pingers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::metrics;
use crate::scheduler::{Phase, SchedulerState};

/// Body of `GET /`
pub const ALIVE_BANNER: &str = "postwatch is alive.";

/// Shared state of the health router
#[derive(Clone)]
pub struct AppState {
    /// Scheduler state to report on
    pub scheduler: Arc<SchedulerState>,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create state starting the uptime clock now
    pub fn new(scheduler: Arc<SchedulerState>) -> Self {
        Self {
            scheduler,
            start_time: Instant::now(),
        }
    }
}

/// Overall health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Starting,
}

impl HealthStatus {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Starting => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Liveness probe response
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_secs: u64,
    pub timestamp: String,
    pub phase: Phase,
    pub ready: bool,
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Readiness probe response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub timestamp: String,
}

/// Create the health router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn root() -> &'static str {
    ALIVE_BANNER
}

/// Liveness probe handler
///
/// Always 200 while the process runs; the body carries the scheduler state.
async fn liveness_probe(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.scheduler.snapshot().await;

    let response = LivenessResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        phase: snapshot.phase,
        ready: snapshot.ready,
        cycles_started: snapshot.cycles_started,
        cycles_completed: snapshot.cycles_completed,
        cycles_failed: snapshot.cycles_failed,
        last_cycle_at: snapshot.last_cycle_at.map(|t| t.to_rfc3339()),
        last_error: snapshot.last_error,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness probe handler
///
/// 503 until the notification channel has been reached.
async fn readiness_probe(State(state): State<AppState>) -> impl IntoResponse {
    let status = if state.scheduler.snapshot().await.ready {
        HealthStatus::Healthy
    } else {
        HealthStatus::Starting
    };

    let response = ReadinessResponse {
        status,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    (status.status_code(), Json(response))
}

/// Prometheus scrape handler
async fn metrics_handler() -> impl IntoResponse {
    match metrics::encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                String::from("failed to encode metrics"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_code() {
        assert_eq!(HealthStatus::Healthy.status_code(), StatusCode::OK);
        assert_eq!(
            HealthStatus::Starting.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_health_status_serialization() {
        let json = serde_json::to_string(&HealthStatus::Starting).unwrap();
        assert_eq!(json, "\"starting\"");
    }
}
