//! Fan-out of alerts to delivery sinks.

use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use tracing::{debug, error, warn};

use super::{
    sinks::{AlertSink, SinkError},
    types::Alert,
};
use crate::{metrics, utils::panic_message};

/// Delivery results for one dispatched alert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Names of sinks that accepted the alert.
    pub delivered: Vec<String>,
    /// Sinks that failed, with their error.
    pub failed: Vec<(String, SinkError)>,
}

/// Invokes every sink for an alert, in order, isolating failures per sink.
///
/// Delivery is best effort and at most once: there is no retry and no queue.
/// An optional per-sink timeout bounds how long one slow sink can hold up the
/// rest of the fan-out and the evaluation loop behind it.
#[derive(Debug, Clone, Default)]
pub struct AlertDispatcher {
    delivery_timeout: Option<Duration>,
}

impl AlertDispatcher {
    #[must_use]
    pub fn new(delivery_timeout: Option<Duration>) -> Self {
        Self { delivery_timeout }
    }

    pub async fn dispatch(&self, alert: &Alert, sinks: &[Arc<dyn AlertSink>]) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for sink in sinks {
            match self.deliver_one(sink.as_ref(), alert).await {
                Ok(()) => {
                    debug!(sink = sink.name(), alert_id = %alert.id, "alert delivered");
                    metrics::record_delivery(sink.name(), true);
                    summary.delivered.push(sink.name().to_string());
                }
                Err(e) => {
                    warn!(
                        component = "alerting",
                        sink = sink.name(),
                        alert_id = %alert.id,
                        error = %e,
                        "alert delivery failed"
                    );
                    metrics::record_delivery(sink.name(), false);
                    summary.failed.push((sink.name().to_string(), e));
                }
            }
        }

        summary
    }

    async fn deliver_one(&self, sink: &dyn AlertSink, alert: &Alert) -> Result<(), SinkError> {
        let delivery = AssertUnwindSafe(sink.deliver(alert)).catch_unwind();

        let outcome = match self.delivery_timeout {
            Some(limit) => match tokio::time::timeout(limit, delivery).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(SinkError::Timeout(limit)),
            },
            None => delivery.await,
        };

        outcome.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            error!(component = "alerting", sink = sink.name(), panic = %message, "sink panicked");
            Err(SinkError::Panicked(message))
        })
    }
}
