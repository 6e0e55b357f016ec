//! HTTP surface for the health-and-alerting engine.

pub mod handlers;
pub mod router;
