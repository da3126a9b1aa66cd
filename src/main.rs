use std::sync::Arc;
use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tracing::info;
use price_feeder::config::AppConfig;
use price_feeder::core::{RunReport, Updater};
use price_feeder::observability::metrics::register_metrics;
use price_feeder::observability::tracing::init_tracing;
use price_feeder::price_infra::connectors::SourceRegistry;
use price_feeder::price_infra::observer::TracingObserver;
use price_feeder::utils::task_supervisor::TaskSupervisor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("FEEDER_ENV").unwrap_or_else(|_| "development".to_string());
    let config = AppConfig::load(&env).context("failed to load configuration")?;

    init_tracing(config.log_format)?;
    register_metrics()?;

    let registry = SourceRegistry::with_fixed_sources(&config.fixed_sources)?;
    info!(sources = registry.len(), env = %env, "Price feeder starting");

    let periodic = config.updater.interval().is_some();
    let updater = Updater::new(config, Arc::new(registry))?
        .with_observer(Arc::new(TracingObserver));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (report_tx, mut report_rx) = mpsc::channel::<RunReport>(16);

    let mut supervisor = TaskSupervisor::new();
    supervisor.spawn("publisher", async move {
        while let Some(report) = report_rx.recv().await {
            for price in &report.prices {
                info!(currency = %price.currency, value = price.value, dispersion = price.dispersion, "Price");
            }
            info!(target: "price_feeder::report", "{}", report.to_json()?);
        }
        Ok::<(), price_feeder::Error>(())
    });
    supervisor.spawn("updater", async move { updater.run(shutdown_rx, report_tx).await });

    if periodic {
        tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
        info!("Shutdown requested");
        // The updater may already have stopped; a closed channel is fine here.
        let _ = shutdown_tx.send(true);
    }

    supervisor.wait_for_task("updater").await?;
    supervisor.wait_for_task("publisher").await?;
    Ok(())
}
