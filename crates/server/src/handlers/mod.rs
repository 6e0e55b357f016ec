//! HTTP endpoint handlers.

pub mod alerts;
pub mod health;
