//! Mock Infrastructure for Testing the Health and Alerting Engine
//!
//! - `FakeStats`, `FakeStorage`, `FakeMetrics`: signal sources a test can change between passes
//! - `RecordingSink`, `FailingSink`, `SlowSink`: in-process alert sinks
//! - `WebhookMock`: wraps mockito to stand in for a webhook receiver


pub use signals::{FakeMetrics, FakeStats, FakeStorage};
pub use sinks::{FailingSink, RecordingSink, SlowSink, WebhookMock};
