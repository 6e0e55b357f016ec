use async_trait::async_trait;
use tracing::{error, info, warn};

use super::{AlertSink, SinkError};
use crate::alerts::types::{Alert, AlertLevel};

/// Writes alerts to the application log at a level matching their severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, alert: &Alert) -> Result<(), SinkError> {
        match alert.level {
            AlertLevel::Critical => error!(
                alert_id = %alert.id,
                component = %alert.component,
                level = %alert.level,
                message = %alert.message,
                "{}", alert.title
            ),
            AlertLevel::Warning => warn!(
                alert_id = %alert.id,
                component = %alert.component,
                level = %alert.level,
                message = %alert.message,
                "{}", alert.title
            ),
            AlertLevel::Info => info!(
                alert_id = %alert.id,
                component = %alert.component,
                level = %alert.level,
                message = %alert.message,
                "{}", alert.title
            ),
        }
        Ok(())
    }
}
