//! Builder pattern for wiring the health checker, alert manager and their signal sources.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{lifecycle::HealthRuntime, HealthComponents};
use crate::{
    alerts::{rules, AlertError, AlertManager, AlertSink, LogSink, Rule, SinkError, WebhookSink},
    clock::{Clock, SystemClock},
    config::AppConfig,
    health::{EvaluatorLivenessCheck, HealthCheck, HealthChecker, MemoryCheck, StorageCheck, ThreadCheck},
    signals::{
        MetricsSource, ProcessStatsReader, StatsError, StorageProbe, SystemStatsSource,
        UnwiredMetrics,
    },
};

const SHUTDOWN_CHANNEL_CAPACITY: usize = 16;

/// Errors that can occur during runtime initialization.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    /// A built-in or caller-supplied rule was rejected
    #[error("Failed to register alert rule: {0}")]
    Rule(#[from] AlertError),

    /// The webhook sink could not be built from configuration
    #[error("Failed to configure alert sink: {0}")]
    Sink(#[from] SinkError),

    /// The process statistics reader could not be created
    #[error("Failed to initialize process statistics: {0}")]
    Stats(#[from] StatsError),
}

#[derive(Clone)]
struct RuntimeOptions {
    enable_periodic_health: bool,
    enable_alert_monitoring: bool,
    enable_builtin_rules: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            enable_periodic_health: false,
            enable_alert_monitoring: false,
            enable_builtin_rules: true,
        }
    }
}

/// Builder for constructing a [`HealthRuntime`].
///
/// Signal sources are injected; anything left unset falls back to a default
/// (the live process reader for system stats, [`UnwiredMetrics`] for metrics,
/// no storage check). Background tasks only start when enabled, so a runtime
/// built without them can be driven manually in tests.
///
/// # Examples
///
/// ```no_run
/// # use tempmail_core::{config::AppConfig, runtime::HealthRuntimeBuilder};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let runtime = HealthRuntimeBuilder::new()
///     .with_config(AppConfig::load()?)
///     .enable_periodic_health()
///     .enable_alert_monitoring()
///     .build()?;
///
/// runtime.wait_for_shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct HealthRuntimeBuilder {
    config: Option<AppConfig>,
    options: RuntimeOptions,
    clock: Option<Arc<dyn Clock>>,
    stats: Option<Arc<dyn SystemStatsSource>>,
    storage: Option<Arc<dyn StorageProbe>>,
    metrics: Option<Arc<dyn MetricsSource>>,
    checks: Vec<Arc<dyn HealthCheck>>,
    rules: Vec<Rule>,
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl HealthRuntimeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: None,
            options: RuntimeOptions::default(),
            clock: None,
            stats: None,
            storage: None,
            metrics: None,
            checks: Vec::new(),
            rules: Vec::new(),
            sinks: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn with_system_stats(mut self, stats: Arc<dyn SystemStatsSource>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Adds a storage liveness check and the storage-down rule.
    #[must_use]
    pub fn with_storage_probe(mut self, probe: Arc<dyn StorageProbe>) -> Self {
        self.storage = Some(probe);
        self
    }

    #[must_use]
    pub fn with_metrics_source(mut self, metrics: Arc<dyn MetricsSource>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Appends a health check after the built-in ones.
    #[must_use]
    pub fn with_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Appends a rule after the built-in ones.
    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends a sink after the log and webhook sinks.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Logs the health report on `health.interval_seconds`.
    #[must_use]
    pub fn enable_periodic_health(mut self) -> Self {
        self.options.enable_periodic_health = true;
        self
    }

    /// Evaluates rules on `alerts.evaluation_interval_seconds` when `alerts.enabled` is set.
    #[must_use]
    pub fn enable_alert_monitoring(mut self) -> Self {
        self.options.enable_alert_monitoring = true;
        self
    }

    /// Skips the built-in memory, GC, storage, error-rate, CPU and health rules.
    #[must_use]
    pub fn without_builtin_rules(mut self) -> Self {
        self.options.enable_builtin_rules = false;
        self
    }

    /// Builds the runtime and starts the enabled background tasks.
    ///
    /// Must be called from within a Tokio runtime when any background task is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] if configuration is missing or invalid, a rule is
    /// rejected, the webhook sink is misconfigured or process stats are unavailable.
    pub fn build(self) -> Result<HealthRuntime, RuntimeError> {
        let config = self.config.ok_or_else(|| {
            RuntimeError::ConfigValidation("No configuration provided".to_string())
        })?;
        config.validate().map_err(RuntimeError::ConfigValidation)?;

        let monitoring = self.options.enable_alert_monitoring && config.alerts.enabled;
        info!(
            environment = %config.environment,
            periodic_health = self.options.enable_periodic_health,
            alert_monitoring = monitoring,
            builtin_rules = self.options.enable_builtin_rules,
            "initializing health runtime"
        );

        let (shutdown_tx, _) = broadcast::channel::<()>(SHUTDOWN_CHANNEL_CAPACITY);

        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let stats: Arc<dyn SystemStatsSource> = match self.stats {
            Some(stats) => stats,
            None => Arc::new(ProcessStatsReader::new()?),
        };
        let metrics: Arc<dyn MetricsSource> =
            self.metrics.unwrap_or_else(|| Arc::new(UnwiredMetrics));

        let alert_manager = Arc::new(
            AlertManager::new()
                .with_clock(clock.clone())
                .with_delivery_timeout(config.delivery_timeout()),
        );
        debug!("alert manager initialized");

        let mut checker = HealthChecker::new(config.version.clone(), config.environment.clone())
            .with_clock(clock.clone());
        if let Some(storage) = &self.storage {
            checker = checker.with_check(Arc::new(StorageCheck::new(storage.clone())));
        }
        checker = checker
            .with_check(Arc::new(MemoryCheck::new(
                stats.clone(),
                config.health.memory_warning_mb,
                config.health.memory_critical_mb,
            )))
            .with_check(Arc::new(ThreadCheck::new(stats.clone(), config.health.max_threads)));
        if monitoring {
            checker = checker.with_check(Arc::new(EvaluatorLivenessCheck::new(
                alert_manager.clone(),
                clock.clone(),
                config.evaluation_interval(),
            )));
        }
        for check in self.checks {
            checker = checker.with_check(check);
        }
        let health_checker = Arc::new(checker);
        debug!(checks = ?health_checker.check_names(), "health checker initialized");

        if self.options.enable_builtin_rules {
            let cooldown = config.default_cooldown();
            let mut builtin = vec![
                rules::high_memory_rule(stats.clone(), config.alerts.memory_threshold_mb),
                rules::high_gc_pause_rule(stats.clone(), config.gc_pause_threshold()),
            ];
            if let Some(storage) = self.storage {
                builtin.push(rules::storage_down_rule(storage));
            }
            builtin.push(rules::high_error_rate_rule(metrics, config.alerts.error_rate_threshold));
            builtin.push(rules::high_cpu_rule(stats, config.alerts.cpu_threshold_percent));
            builtin.push(rules::unhealthy_service_rule(health_checker.clone()));

            for rule in builtin {
                alert_manager.add_rule(rule.with_cooldown(cooldown))?;
            }
        }
        for rule in self.rules {
            alert_manager.add_rule(rule)?;
        }
        debug!(rules = ?alert_manager.rule_ids(), "alert rules registered");

        alert_manager.add_sink(Arc::new(LogSink));
        if let Some(webhook) = WebhookSink::from_config(&config.webhook)? {
            info!(url = %webhook.url(), "webhook alert sink enabled");
            alert_manager.add_sink(Arc::new(webhook));
        }
        for sink in self.sinks {
            alert_manager.add_sink(sink);
        }

        let components = HealthComponents::new(health_checker, alert_manager);
        let runtime = HealthRuntime::new(
            components,
            shutdown_tx,
            config,
            self.options.enable_periodic_health,
            monitoring,
        );

        info!("health runtime initialization complete");
        Ok(runtime)
    }
}

impl Default for HealthRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
