//! Core component container for the health runtime.

use std::sync::Arc;

use crate::{alerts::AlertManager, health::HealthChecker};

/// Shared handles to the initialized engine components.
///
/// Cheap to clone; HTTP handlers and embedders hold a copy.
#[derive(Clone)]
pub struct HealthComponents {
    health_checker: Arc<HealthChecker>,
    alert_manager: Arc<AlertManager>,
}

impl HealthComponents {
    /// Called by `HealthRuntimeBuilder` during initialization.
    #[must_use]
    pub fn new(health_checker: Arc<HealthChecker>, alert_manager: Arc<AlertManager>) -> Self {
        Self { health_checker, alert_manager }
    }

    #[must_use]
    pub fn health_checker(&self) -> &Arc<HealthChecker> {
        &self.health_checker
    }

    #[must_use]
    pub fn alert_manager(&self) -> &Arc<AlertManager> {
        &self.alert_manager
    }
}
