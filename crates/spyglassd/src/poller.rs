//! The timer-driven polling loop.
//!
//! One tick = probe the server status, count the persisted player
//! profiles, publish one signed snapshot. Every per-tick failure is
//! logged and swallowed at the tick boundary; nothing short of the
//! shutdown signal stops the loop. Ticks never overlap: the loop sleeps
//! a full interval, runs the pipeline to completion, then sleeps again,
//! so a slow tick simply delays the next one.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use spyglass_probe::ping;
use spyglass_telemetry::{Publisher, Snapshot};

use crate::config::Config;
use crate::population;

/// Runs the poll, count, publish pipeline on a fixed interval.
pub struct Poller {
    config: Arc<Config>,
    publisher: Publisher,
    interval: Duration,
    probe_timeout: Duration,
}

impl Poller {
    pub fn new(
        config: Arc<Config>,
        publisher: Publisher,
        interval: Duration,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            config,
            publisher,
            interval,
            probe_timeout,
        }
    }

    /// Run ticks until the shutdown signal fires.
    ///
    /// Shutdown is honored both between ticks and in the middle of one:
    /// an in-flight tick is abandoned, dropping whatever connection it
    /// was blocked on.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "poller started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => {
                    info!("poller shutting down");
                    break;
                }
            }

            tokio::select! {
                _ = self.tick() => {}
                _ = shutdown.changed() => {
                    info!("poller shutting down, abandoning in-flight tick");
                    break;
                }
            }
        }
    }

    /// One pipeline pass: probe, count, publish.
    ///
    /// Errors are logged here and never propagated; a probe failure
    /// skips the publish entirely for this tick.
    async fn tick(&self) {
        let reply = match ping(&self.config.host, self.config.port, self.probe_timeout).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "status probe failed, skipping publish for this tick");
                return;
            }
        };
        debug!(
            online = reply.online_players,
            max = reply.max_players,
            version = ?reply.version,
            "status reply received"
        );

        let population = population::count_profiles(&self.config.data_volume);
        info!(population, "server population counted");

        let snapshot = Snapshot {
            pod_name: self.config.pod_name.clone(),
            online_players: reply.online_players,
            max_players: reply.max_players,
            population,
        };

        match self.publisher.publish(&snapshot).await {
            Ok(receipt) => debug!(status = %receipt.status, "telemetry delivery completed"),
            Err(e) => warn!(error = %e, "telemetry delivery failed"),
        }
    }
}
