//! Scheduled gate evaluation loop.
//!
//! Spawns a background task that evaluates the controller's quality gates
//! on a fixed cadence until shut down. Overlap suppression lives in the
//! controller; the monitor just ticks.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::controller::{CanaryController, EvalOutcome, MetricsSource};
use dirigent_store::RolloutLedger;

/// Monitor cadence configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between gate evaluations
    pub interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// Handle to a running monitor loop.
pub struct RolloutMonitor {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RolloutMonitor {
    /// Start the evaluation loop for `controller`.
    ///
    /// The first evaluation happens one full interval after start, not
    /// immediately, so a freshly advanced stage has a window to accumulate
    /// samples.
    pub fn start<L, M>(controller: Arc<CanaryController<L, M>>, config: MonitorConfig) -> Self
    where
        L: RolloutLedger + 'static,
        M: MetricsSource + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(config.interval_secs));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // interval fires immediately on the first tick; consume it
            ticker.tick().await;

            info!(
                event = "monitor.started",
                rollout_id = %controller.spec().rollout_id,
                interval_secs = config.interval_secs,
                "rollout monitor started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match controller.evaluate_quality_gates().await {
                            Ok(EvalOutcome::RolledBack(verdict)) => {
                                warn!(
                                    event = "monitor.rolled_back",
                                    rollout_id = %controller.spec().rollout_id,
                                    message = %verdict.message,
                                    "gate failure triggered rollback"
                                );
                            }
                            Ok(_) => {}
                            Err(err) => {
                                warn!(
                                    event = "monitor.eval_error",
                                    rollout_id = %controller.spec().rollout_id,
                                    error = %err,
                                    "gate evaluation failed"
                                );
                            }
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!(
                                event = "monitor.stopped",
                                rollout_id = %controller.spec().rollout_id,
                                "rollout monitor stopped"
                            );
                            break;
                        }
                    }
                }
            }
        });

        Self {
            shutdown: shutdown_tx,
            handle,
        }
    }

    /// Signal the loop to stop and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}
