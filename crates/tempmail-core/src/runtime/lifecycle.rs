//! Runtime lifecycle management including background tasks and graceful shutdown.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info, warn};

use super::{builder::HealthRuntimeBuilder, HealthComponents};
use crate::{alerts::AlertManager, config::AppConfig, health::HealthChecker};

/// Owns the engine components and their background tasks.
///
/// Both tasks listen on one broadcast channel. [`HealthRuntime::shutdown`]
/// signals them and waits for each to finish its current pass.
pub struct HealthRuntime {
    components: HealthComponents,
    shutdown_tx: broadcast::Sender<()>,
    config: AppConfig,
    tasks: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
    shutdown_initiated: Arc<AtomicBool>,
}

impl HealthRuntime {
    #[must_use]
    pub fn builder() -> HealthRuntimeBuilder {
        HealthRuntimeBuilder::new()
    }

    /// Called by `HealthRuntimeBuilder` once components are wired.
    pub(super) fn new(
        components: HealthComponents,
        shutdown_tx: broadcast::Sender<()>,
        config: AppConfig,
        enable_periodic_health: bool,
        enable_alert_monitoring: bool,
    ) -> Self {
        let mut tasks = Vec::new();

        if enable_periodic_health {
            let handle = components
                .health_checker()
                .clone()
                .start_with_shutdown(config.health_interval(), shutdown_tx.subscribe());
            debug!("periodic health task started");
            tasks.push(("periodic_health", handle));
        }

        if enable_alert_monitoring {
            let handle = components
                .alert_manager()
                .clone()
                .start_monitoring(config.evaluation_interval(), shutdown_tx.subscribe());
            debug!("alert monitoring task started");
            tasks.push(("alert_monitoring", handle));
        }

        Self {
            components,
            shutdown_tx,
            config,
            tasks: Mutex::new(tasks),
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn components(&self) -> &HealthComponents {
        &self.components
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn health_checker(&self) -> &Arc<HealthChecker> {
        self.components.health_checker()
    }

    #[must_use]
    pub fn alert_manager(&self) -> &Arc<AlertManager> {
        self.components.alert_manager()
    }

    /// Number of background tasks still owned by the runtime.
    #[must_use]
    pub fn running_tasks(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Creates a new shutdown receiver for custom background tasks.
    #[must_use]
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Signals every background task to stop, waits for them, then waits for
    /// alert deliveries still in flight.
    ///
    /// Idempotent: only the first call broadcasts and joins; later calls return immediately.
    pub async fn shutdown(&self) {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("shutdown already initiated, ignoring duplicate call");
            return;
        }

        info!("initiating health runtime shutdown");
        if self.shutdown_tx.send(()).is_err() {
            debug!("no background tasks listening for shutdown");
        }

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for (name, handle) in tasks {
            match handle.await {
                Ok(()) => debug!(task = name, "background task completed"),
                Err(e) if e.is_cancelled() => debug!(task = name, "background task cancelled"),
                Err(e) => error!(task = name, error = %e, "background task failed"),
            }
        }

        let pending = self.components.alert_manager().wait_for_deliveries().await;
        if !pending.is_empty() {
            debug!(deliveries = pending.len(), "in-flight alert deliveries finished");
        }

        info!("health runtime shutdown complete");
    }

    /// Waits for Ctrl+C, SIGTERM (on Unix) or a shutdown broadcast, then shuts down.
    pub async fn wait_for_shutdown(&self) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => info!("ctrl-c received, runtime terminating"),
            () = terminate => info!("SIGTERM received, runtime terminating"),
            _ = shutdown_rx.recv() => info!("shutdown signal received, runtime terminating"),
        }
        self.shutdown().await;
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    let _ = assert_send::<HealthRuntime>;
    let _ = assert_sync::<HealthRuntime>;
};
