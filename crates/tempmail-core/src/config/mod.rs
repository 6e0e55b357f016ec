//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: `set_default` calls mirroring the `Default` impls
//! 2. **Config file**: TOML file named by the `TEMPMAIL_CONFIG` env var
//!    (`config/config.toml` when unset; a missing file is not an error)
//! 3. **Environment variables**: `TEMPMAIL__SECTION__FIELD` overrides a single field
//!
//! # Example
//!
//! ```toml
//! environment = "production"
//!
//! [health]
//! interval_seconds = 30
//! memory_critical_mb = 2048
//!
//! [alerts]
//! evaluation_interval_seconds = 15
//!
//! [webhook]
//! url = "https://hooks.example.com/tempmail"
//! headers = { "x-webhook-token" = "change-me" }
//! ```

use std::{collections::HashMap, path::Path, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// HTTP server settings for the health and alert endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// IP address to bind to. Defaults to `127.0.0.1`.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port to listen on. Defaults to `8081`.
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    8081
}

/// Health aggregation settings and thresholds for the built-in checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Seconds between periodic health reports. Defaults to `60`.
    #[serde(default = "default_health_interval")]
    pub interval_seconds: u64,

    /// Resident memory above which the memory check is degraded. Defaults to `512`.
    #[serde(default = "default_memory_warning_mb")]
    pub memory_warning_mb: u64,

    /// Resident memory above which the memory check is unhealthy. Defaults to `1024`.
    #[serde(default = "default_memory_critical_mb")]
    pub memory_critical_mb: u64,

    /// Thread count above which the thread check is degraded. Defaults to `1000`.
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
}

fn default_health_interval() -> u64 {
    60
}

fn default_memory_warning_mb() -> u64 {
    512
}

fn default_memory_critical_mb() -> u64 {
    1024
}

fn default_max_threads() -> usize {
    1000
}

/// Rule evaluation settings and thresholds for the built-in rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Whether the background evaluator runs. Defaults to `true`.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between evaluation passes. Defaults to `30`.
    #[serde(default = "default_evaluation_interval")]
    pub evaluation_interval_seconds: u64,

    /// Cooldown applied to the built-in rules. Defaults to `300`.
    #[serde(default = "default_cooldown_seconds")]
    pub default_cooldown_seconds: u64,

    /// Upper bound on a single sink delivery. Defaults to `15`.
    #[serde(default = "default_delivery_timeout")]
    pub delivery_timeout_seconds: u64,

    /// Defaults to `1024`.
    #[serde(default = "default_memory_critical_mb")]
    pub memory_threshold_mb: u64,

    /// Defaults to `1000`.
    #[serde(default = "default_gc_pause_threshold_ms")]
    pub gc_pause_threshold_ms: u64,

    /// Fraction of failed HTTP responses, in `0.0..=1.0`. Defaults to `0.05`.
    #[serde(default = "default_error_rate_threshold")]
    pub error_rate_threshold: f64,

    /// Defaults to `90.0`.
    #[serde(default = "default_cpu_threshold")]
    pub cpu_threshold_percent: f64,
}

fn default_true() -> bool {
    true
}

fn default_evaluation_interval() -> u64 {
    30
}

fn default_cooldown_seconds() -> u64 {
    300
}

fn default_delivery_timeout() -> u64 {
    15
}

fn default_gc_pause_threshold_ms() -> u64 {
    1000
}

fn default_error_rate_threshold() -> f64 {
    0.05
}

fn default_cpu_threshold() -> f64 {
    90.0
}

/// Webhook sink settings. The sink is only registered when `url` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub url: Option<String>,

    /// Request timeout in seconds. Defaults to `10`.
    #[serde(default = "default_webhook_timeout")]
    pub timeout_seconds: u64,

    /// Extra headers sent with every delivery, e.g. an auth token.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_webhook_timeout() -> u64 {
    10
}

/// Application logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset. Defaults to `"info"`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// Root configuration for the health-and-alerting engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment environment reported in health reports. Defaults to `"development"`.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Service version reported in health reports. Defaults to the crate version.
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub alerts: AlertsConfig,

    #[serde(default)]
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: default_bind_address(), bind_port: default_bind_port() }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_health_interval(),
            memory_warning_mb: default_memory_warning_mb(),
            memory_critical_mb: default_memory_critical_mb(),
            max_threads: default_max_threads(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            evaluation_interval_seconds: default_evaluation_interval(),
            default_cooldown_seconds: default_cooldown_seconds(),
            delivery_timeout_seconds: default_delivery_timeout(),
            memory_threshold_mb: default_memory_critical_mb(),
            gc_pause_threshold_ms: default_gc_pause_threshold_ms(),
            error_rate_threshold: default_error_rate_threshold(),
            cpu_threshold_percent: default_cpu_threshold(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self { url: None, timeout_seconds: default_webhook_timeout(), headers: HashMap::new() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: default_log_format() }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            version: default_version(),
            server: ServerConfig::default(),
            health: HealthConfig::default(),
            alerts: AlertsConfig::default(),
            webhook: WebhookConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// Use `__` as a separator for nested fields (e.g. `TEMPMAIL__ALERTS__ENABLED=false`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be parsed or deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("environment", "development")?
            .set_default("version", default_version())?
            .set_default("server.bind_address", "127.0.0.1")?
            .set_default("server.bind_port", 8081)?
            .set_default("health.interval_seconds", 60)?
            .set_default("health.memory_warning_mb", 512)?
            .set_default("health.memory_critical_mb", 1024)?
            .set_default("health.max_threads", 1000)?
            .set_default("alerts.enabled", true)?
            .set_default("alerts.evaluation_interval_seconds", 30)?
            .set_default("alerts.default_cooldown_seconds", 300)?
            .set_default("alerts.delivery_timeout_seconds", 15)?
            .set_default("alerts.memory_threshold_mb", 1024)?
            .set_default("alerts.gc_pause_threshold_ms", 1000)?
            .set_default("alerts.error_rate_threshold", 0.05)?
            .set_default("alerts.cpu_threshold_percent", 90.0)?
            .set_default("webhook.timeout_seconds", 10)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("TEMPMAIL").separator("__").try_parsing(true))
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from `config/config.toml` with fallback to defaults.
    ///
    /// The path can be overridden with the `TEMPMAIL_CONFIG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("TEMPMAIL_CONFIG").unwrap_or_else(|_| "config/config.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Returns the parsed socket address for the HTTP server.
    ///
    /// # Errors
    ///
    /// Returns an error string if the address cannot be parsed.
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, String> {
        format!("{}:{}", self.server.bind_address, self.server.bind_port)
            .parse()
            .map_err(|_| {
                format!(
                    "Invalid socket address: {}:{}",
                    self.server.bind_address, self.server.bind_port
                )
            })
    }

    #[must_use]
    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health.interval_seconds)
    }

    #[must_use]
    pub fn evaluation_interval(&self) -> Duration {
        Duration::from_secs(self.alerts.evaluation_interval_seconds)
    }

    #[must_use]
    pub fn default_cooldown(&self) -> Duration {
        Duration::from_secs(self.alerts.default_cooldown_seconds)
    }

    #[must_use]
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.alerts.delivery_timeout_seconds)
    }

    #[must_use]
    pub fn gc_pause_threshold(&self) -> Duration {
        Duration::from_millis(self.alerts.gc_pause_threshold_ms)
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string for the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_port == 0 {
            return Err("Bind port must be greater than 0".to_string());
        }

        if self.health.interval_seconds == 0 {
            return Err("Health check interval must be greater than 0".to_string());
        }

        if self.health.memory_warning_mb > self.health.memory_critical_mb {
            return Err(format!(
                "Memory warning threshold ({}MB) must not exceed critical threshold ({}MB)",
                self.health.memory_warning_mb, self.health.memory_critical_mb
            ));
        }

        if self.alerts.evaluation_interval_seconds == 0 {
            return Err("Alert evaluation interval must be greater than 0".to_string());
        }

        if self.alerts.delivery_timeout_seconds == 0 {
            return Err("Alert delivery timeout must be greater than 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.alerts.error_rate_threshold) {
            return Err(format!(
                "Error rate threshold must be between 0 and 1, got {}",
                self.alerts.error_rate_threshold
            ));
        }

        if !self.alerts.cpu_threshold_percent.is_finite() || self.alerts.cpu_threshold_percent <= 0.0
        {
            return Err(format!(
                "CPU threshold must be a positive percentage, got {}",
                self.alerts.cpu_threshold_percent
            ));
        }

        if let Some(url) = self.webhook.url.as_deref().filter(|u| !u.is_empty()) {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("Invalid webhook URL: {url}"));
            }
        }

        if self.webhook.timeout_seconds == 0 {
            return Err("Webhook timeout must be greater than 0".to_string());
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        Ok(())
    }
}
