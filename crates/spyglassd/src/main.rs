//! spyglassd, the game-server telemetry sidecar.
//!
//! On a fixed interval the daemon probes the target server's status,
//! counts persisted player profiles on the data volume, and pushes one
//! signed snapshot to the collector endpoint. Two tasks run until exit:
//! the polling loop and a signal listener that triggers shutdown through
//! a shared watch channel.
//!
//! # Usage
//!
//! ```text
//! RCON_POD_NAME=pod-a RCON_HOST=mc.internal RCON_PORT=25565 \
//! RCON_DATA_VOLUME=/data/world/playerdata \
//! RCON_AZURE_CUSTOMER_ID=... RCON_AZURE_SHARED_KEY=... \
//! spyglassd run --interval 30
//! ```

mod config;
mod population;
mod poller;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use spyglass_telemetry::Publisher;

use crate::config::Config;
use crate::poller::Poller;

#[derive(Parser)]
#[command(name = "spyglassd", about = "Game-server telemetry sidecar")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the polling loop until terminated.
    Run {
        /// Seconds between polling ticks.
        #[arg(long, default_value = "30")]
        interval: u64,

        /// Status probe timeout in seconds.
        #[arg(long, default_value = "5")]
        probe_timeout: u64,

        /// Telemetry delivery timeout in seconds.
        #[arg(long, default_value = "10")]
        publish_timeout: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,spyglassd=debug,spyglass=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            interval,
            probe_timeout,
            publish_timeout,
        } => {
            run(
                Duration::from_secs(interval),
                Duration::from_secs(probe_timeout),
                Duration::from_secs(publish_timeout),
            )
            .await
        }
    }
}

async fn run(
    interval: Duration,
    probe_timeout: Duration,
    publish_timeout: Duration,
) -> anyhow::Result<()> {
    info!("spyglass agent starting");

    // Configuration problems are fatal: exit non-zero before the first tick.
    let config = Config::from_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    let config = Arc::new(config);
    info!(
        pod = %config.pod_name,
        host = %config.host,
        port = config.port,
        data_volume = %config.data_volume.display(),
        "configuration loaded"
    );

    let publisher = Publisher::new(
        config.customer_id.clone(),
        config.decoded_shared_key()?,
        config.endpoint()?,
        publish_timeout,
    )?;

    // ── Shutdown signal ────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Polling loop ───────────────────────────────────────────
    let poller = Poller::new(config, publisher, interval, probe_timeout);
    let poller_handle = tokio::spawn(poller.run(shutdown_rx));

    // ── Wait for termination ───────────────────────────────────
    wait_for_signal().await;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    // The poller honors the signal mid-tick; no drain is attempted.
    let _ = poller_handle.await;

    info!("spyglass agent stopped");
    Ok(())
}

/// Resolve when either SIGINT (Ctrl-C) or SIGTERM arrives.
async fn wait_for_signal() {
    let mut terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}
