use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};
use tracing::debug;

use super::{AlertSink, SinkError};
use crate::{alerts::types::Alert, config::WebhookConfig};

/// Default client-side timeout for webhook deliveries.
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of response body bytes kept in an [`SinkError::Http`].
const MAX_ERROR_BODY: usize = 256;

/// POSTs each alert as JSON to a fixed URL.
///
/// Any transport error or non-2xx response is a failed delivery. Extra headers
/// (for example an auth token expected by the receiver) are sent with every request.
pub struct WebhookSink {
    client: Client,
    url: String,
    headers: HeaderMap,
    timeout: Duration,
}

impl WebhookSink {
    /// Creates a sink posting to `url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::InvalidConfig`] if the URL is not http(s) or the
    /// HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SinkError::InvalidConfig(format!("webhook url must be http(s): {url}")));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::InvalidConfig(e.to_string()))?;

        Ok(Self { client, url, headers: HeaderMap::new(), timeout })
    }

    /// Builds a sink from configuration, or `None` when no URL is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::InvalidConfig`] for a bad URL or header.
    pub fn from_config(config: &WebhookConfig) -> Result<Option<Self>, SinkError> {
        let Some(url) = config.url.as_deref().filter(|u| !u.is_empty()) else {
            return Ok(None);
        };

        let sink = Self::new(url, Duration::from_secs(config.timeout_seconds))?
            .with_headers(&config.headers)?;
        Ok(Some(sink))
    }

    /// Adds headers sent with every delivery.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::InvalidConfig`] if a name or value is not a valid header.
    pub fn with_headers(mut self, headers: &HashMap<String, String>) -> Result<Self, SinkError> {
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SinkError::InvalidConfig(format!("header {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SinkError::InvalidConfig(format!("header {name}: {e}")))?;
            self.headers.insert(name, value);
        }
        Ok(self)
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, alert: &Alert) -> Result<(), SinkError> {
        let body = serde_json::to_vec(alert).map_err(|e| SinkError::Serialization(e.to_string()))?;

        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SinkError::Timeout(self.timeout)
                } else {
                    SinkError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(SinkError::Http { status: status.as_u16(), body });
        }

        debug!(alert_id = %alert.id, status = status.as_u16(), "webhook delivered alert");
        Ok(())
    }
}
