//! Engine metrics emitted through the `metrics` facade.
//!
//! The engine only writes these series; it never reads them back to drive
//! behaviour. A Prometheus recorder is installed lazily the first time a
//! handle is requested, so embedders that bring their own recorder are not
//! affected.

use std::sync::OnceLock;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::{alerts::AlertLevel, health::HealthStatus};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the process-wide Prometheus recorder if it is not installed yet.
///
/// Falls back to a detached recorder if another global recorder is already
/// installed; its output then only contains series recorded through it.
/// Call before any component records a metric.
pub fn install_recorder() -> &'static PrometheusHandle {
    PROMETHEUS_HANDLE.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            tracing::debug!("prometheus recorder installed");
            handle
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to install prometheus recorder, using detached recorder");
            PrometheusBuilder::new().build_recorder().handle()
        }
    })
}

/// Returns the process-wide Prometheus handle, installing the recorder on first use.
pub fn prometheus_handle() -> PrometheusHandle {
    install_recorder().clone()
}

pub fn record_alert_opened(rule_id: &str, level: AlertLevel) {
    counter!(
        "tempmail_alerts_opened_total",
        "rule" => rule_id.to_string(),
        "level" => level.as_str()
    )
    .increment(1);
}

pub fn record_rule_error(rule_id: &str) {
    counter!("tempmail_alert_rule_errors_total", "rule" => rule_id.to_string()).increment(1);
}

pub fn record_delivery(sink: &str, success: bool) {
    let outcome = if success { "delivered" } else { "failed" };
    counter!(
        "tempmail_alert_deliveries_total",
        "sink" => sink.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Sets the health gauge: 0 healthy, 1 degraded, 2 unhealthy.
pub fn record_health_status(status: HealthStatus) {
    gauge!("tempmail_health_status").set(status.as_gauge_value());
}
