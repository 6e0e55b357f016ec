//! Small helpers shared across the engine.

use std::{any::Any, time::Duration};

use serde::Serializer;

/// Extracts a printable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Formats a long-running span as `"{days}d {hours}h {mins}m {secs}s"`.
#[must_use]
pub fn format_uptime(duration: Duration) -> String {
    let secs = duration.as_secs();
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let mins = (secs % 3600) / 60;
    let rem = secs % 60;
    format!("{days}d {hours}h {mins}m {rem}s")
}

pub(crate) fn serialize_uptime<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_uptime(*duration))
}

/// Serializes a short span using `Duration`'s debug form, e.g. `"1.5ms"`.
pub(crate) fn serialize_short_duration<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{duration:?}"))
}
