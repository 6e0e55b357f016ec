//! Alert endpoint handlers.

#![allow(clippy::missing_errors_doc)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tempmail_core::alerts::{Alert, RuleState};

use crate::router::AppState;

/// Response for `POST /alerts/{id}/resolve`.
///
/// Resolving an unknown or already-resolved alert succeeds without effect;
/// `changed` tells the caller whether this request did the transition.
#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub success: bool,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<Alert>,
}

/// GET /alerts
pub async fn list_alerts(State(state): State<AppState>) -> Json<Vec<Alert>> {
    Json(state.alerts.get_alerts())
}

/// GET /alerts/active
pub async fn list_active_alerts(State(state): State<AppState>) -> Json<Vec<Alert>> {
    Json(state.alerts.get_active_alerts())
}

/// GET /alerts/rules
///
/// Cooldown bookkeeping for every registered rule.
pub async fn list_rules(State(state): State<AppState>) -> Json<Vec<RuleState>> {
    Json(state.alerts.rule_states())
}

/// GET /alerts/{id}
pub async fn get_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<String>,
) -> Result<Json<Alert>, StatusCode> {
    state.alerts.get_alert(&alert_id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// POST /alerts/{id}/resolve
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<String>,
) -> Json<ResolveResponse> {
    let changed = state.alerts.resolve_alert(&alert_id);
    Json(ResolveResponse { success: true, changed, alert: state.alerts.get_alert(&alert_id) })
}
