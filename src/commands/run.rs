use anyhow::{Context, Result};

use postwatch::config::Config;
use postwatch::metrics;
use postwatch::scheduler::Scheduler;
use postwatch::server::{AppState, HealthServer};

use super::build_pipeline;

/// Run the watch loop with the health server until Ctrl-C
pub async fn run(config: Config) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed, continuing without metrics");
    }

    let scheduler = Scheduler::new(build_pipeline(&config)?, config.interval());
    let shutdown = scheduler.shutdown_handle();

    let (server_stop, server_stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = HealthServer::new(config.server.port, AppState::new(scheduler.state()));
    let server_task = tokio::spawn(server.start_with_shutdown(async move {
        let _ = server_stop_rx.await;
    }));

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received, stopping after the current cycle");
                shutdown.shutdown();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    tracing::info!(
        url = %config.target.url,
        channel_id = %config.channel_id(),
        interval_secs = config.watch.interval_secs,
        cache_capacity = config.watch.cache_capacity,
        "Starting watch loop"
    );

    let result = scheduler.run().await;

    let _ = server_stop.send(());
    match server_task.await {
        Ok(Err(e)) => tracing::error!(error = %e, "Health server failed"),
        Err(e) => tracing::error!(error = %e, "Health server task panicked"),
        Ok(Ok(())) => {}
    }

    result.context("Watch loop stopped")
}

/// Run a single cycle and print its report
pub async fn once(config: Config) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let mut scheduler = Scheduler::new(build_pipeline(&config)?, config.interval());

    match scheduler.run_once().await.context("Notification channel not ready")? {
        Some(report) => println!("{}", serde_json::to_string_pretty(&report)?),
        None => {
            let snapshot = scheduler.state().snapshot().await;
            anyhow::bail!(
                "Cycle failed: {}",
                snapshot.last_error.unwrap_or_else(|| "interrupted".to_string())
            );
        }
    }

    Ok(())
}
