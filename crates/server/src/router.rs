use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tempmail_core::{alerts::AlertManager, health::HealthChecker, runtime::HealthComponents};

use crate::handlers::{alerts, health};

/// Shared handler state: the two engine coordinators.
#[derive(Clone)]
pub struct AppState {
    pub health: Arc<HealthChecker>,
    pub alerts: Arc<AlertManager>,
}

impl AppState {
    #[must_use]
    pub fn new(health: Arc<HealthChecker>, alerts: Arc<AlertManager>) -> Self {
        Self { health, alerts }
    }
}

impl From<&HealthComponents> for AppState {
    fn from(components: &HealthComponents) -> Self {
        Self::new(components.health_checker().clone(), components.alert_manager().clone())
    }
}

/// Builds the router for the health, alert and metrics endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::handle_health))
        .route("/metrics", get(health::handle_metrics))
        .route("/alerts", get(alerts::list_alerts))
        .route("/alerts/active", get(alerts::list_active_alerts))
        .route("/alerts/rules", get(alerts::list_rules))
        .route("/alerts/{id}", get(alerts::get_alert))
        .route("/alerts/{id}/resolve", post(alerts::resolve_alert))
        .with_state(state)
}
