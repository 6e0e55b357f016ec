//! Health and metrics endpoint handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tempmail_core::health::HealthStatus;

use crate::router::AppState;

/// GET /health
///
/// Runs every health check. Healthy and degraded report 200 so load balancers
/// keep routing; unhealthy reports 503.
pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.health.check_health();
    let status = match report.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(report))
}

/// GET /metrics
pub async fn handle_metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        tempmail_core::metrics::prometheus_handle().render(),
    )
}
