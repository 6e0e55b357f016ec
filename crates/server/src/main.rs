use std::net::SocketAddr;

use anyhow::Result;
use axum::serve;
use server::router::{self, AppState};
use tempmail_core::{config::AppConfig, runtime::HealthRuntime};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the logging system based on the configuration.
///
/// `RUST_LOG` wins when set; otherwise `logging.level` applies to this
/// workspace's crates and everything else logs at `warn`.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config.logging.level.as_str();
        EnvFilter::new(format!("warn,tempmail_core={level},server={level}"))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.as_str() == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer().json();
        registry.with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config =
        AppConfig::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;

    init_logging(&config);
    info!(environment = %config.environment, version = %config.version, "starting tempmail health service");
    debug!(
        health_interval_secs = config.health.interval_seconds,
        evaluation_interval_secs = config.alerts.evaluation_interval_seconds,
        webhook_enabled = config.webhook.url.is_some(),
        "configuration loaded"
    );

    let addr: SocketAddr = config.socket_addr().map_err(|e| anyhow::anyhow!(e))?;

    tempmail_core::metrics::install_recorder();

    let runtime = HealthRuntime::builder()
        .with_config(config)
        .enable_periodic_health()
        .enable_alert_monitoring()
        .build()?;

    let app = router::create_router(AppState::from(runtime.components()));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "health server listening");

    let mut server_shutdown = runtime.shutdown_receiver();
    let mut server = tokio::spawn(async move {
        serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.recv().await;
            })
            .await
    });

    let exited_early = tokio::select! {
        () = runtime.wait_for_shutdown() => None,
        result = &mut server => Some(result),
    };
    let result = match exited_early {
        Some(result) => {
            runtime.shutdown().await;
            result
        }
        None => server.await,
    };
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "server error occurred"),
        Err(e) => error!(error = %e, "server task failed"),
    }

    info!("server shutdown complete");
    Ok(())
}
