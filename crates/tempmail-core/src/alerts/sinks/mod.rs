//! Alert delivery sinks.
//!
//! A sink is the only place an alert leaves the process. Sinks are invoked by
//! the [`AlertDispatcher`](super::AlertDispatcher) in registration order, and a
//! failing sink never prevents delivery to the others.

pub mod log;
pub mod webhook;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use super::types::Alert;

pub use log::LogSink;
pub use webhook::WebhookSink;

/// Errors a sink may report for a single delivery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SinkError {
    /// The receiver answered with a non-2xx status.
    #[error("HTTP error: {status} {body}")]
    Http { status: u16, body: String },

    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Delivery did not finish within the allotted time.
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    /// The alert could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The sink panicked while delivering.
    #[error("sink panicked: {0}")]
    Panicked(String),

    /// The sink was constructed with unusable settings.
    #[error("invalid sink configuration: {0}")]
    InvalidConfig(String),
}

/// Delivery endpoint for alerts.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Identifies the sink in logs and metrics.
    fn name(&self) -> &str;

    /// Delivers one alert. Called at most once per alert; failures are not retried.
    async fn deliver(&self, alert: &Alert) -> Result<(), SinkError>;
}
