//! Background worker for continuous Janitor operation

use crate::{Janitor, JanitorConfig, JanitorError, JanitorMetrics, SweepReport};
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Background worker that runs the Janitor on a schedule
///
/// Each sweep runs on the blocking pool since it touches the file system.
/// The first sweep happens as soon as the worker starts.
pub struct JanitorWorker {
    janitor: Arc<Janitor>,
    interval: Duration,
}

impl JanitorWorker {
    /// Create a worker sweeping at the configured interval
    pub fn new(janitor: Arc<Janitor>, config: &JanitorConfig) -> Self {
        Self {
            janitor,
            interval: config.sweep_interval(),
        }
    }

    /// Run until `shutdown` is cancelled
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Janitor worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("Starting sweep cycle");
                    if let Err(e) = self.sweep_once().await {
                        tracing::error!("Sweep failed: {}", e);
                    }
                }
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown signal received, stopping janitor");
                    break;
                }
            }
        }

        tracing::info!(
            "Janitor stopped. Final metrics:\n{}",
            self.janitor.metrics().summary()
        );
    }

    /// Run for a specific number of cycles (useful for testing)
    pub async fn run_cycles(&self, cycles: usize) -> Result<(), JanitorError> {
        let mut ticker = interval(self.interval);

        tracing::info!(
            "Janitor worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;
            let report = self.sweep_once().await?;
            tracing::debug!(
                "Sweep {}/{} completed: {} evicted",
                cycle + 1,
                cycles,
                report.evicted_count()
            );
        }

        Ok(())
    }

    /// Current metrics of the underlying janitor
    pub fn metrics(&self) -> JanitorMetrics {
        self.janitor.metrics()
    }

    async fn sweep_once(&self) -> Result<SweepReport, JanitorError> {
        let janitor = Arc::clone(&self.janitor);
        tokio::task::spawn_blocking(move || janitor.sweep())
            .await
            .map_err(|e| JanitorError::Worker(e.to_string()))
    }
}
