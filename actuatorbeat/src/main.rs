//! Actuatorbeat - polls Spring Boot actuators and publishes normalized events
//!
//! Bootstrap only: configuration, logging, output sink, signal handling.
//! Polling itself lives in the library (`Fleet`).

use actuatorbeat::{config, publisher, EndpointClient, Fleet};
use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("actuatorbeat=info")),
        )
        .init();

    info!("🚀 actuatorbeat v{} starting...", env!("CARGO_PKG_VERSION"));

    let settings = config::load_settings()
        .await
        .context("Failed to load configuration")?;

    debug!("Period {:?}", settings.poll.period);
    debug!("Watch {:?}", settings.targets.iter().map(|t| t.identity()).collect::<Vec<_>>());
    debug!("Metrics statistics {}", settings.poll.poll_metrics);
    debug!("Health statistics {}", settings.poll.poll_health);

    let sink = publisher::connect(&settings.output);
    let fleet = Fleet::start(settings.targets, settings.poll, EndpointClient::new(), sink.clone());

    let stopper = fleet.clone();
    tokio::spawn(async move {
        stopper.stop_on_signal(shutdown_signal(), tokio::signal::ctrl_c()).await;
    });

    info!("✅ actuatorbeat is running! Hit CTRL-C to stop it.");
    fleet.run().await;

    sink.close().await;
    info!("🛑 actuatorbeat stopped");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
