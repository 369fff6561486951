//! Expiry Sweeper
//!
//! Background task that periodically removes expired counters, bounding memory
//! for entries that are written but never read again.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::batch::SharedStore;
use crate::cache::current_timestamp_ms;

/// Shortest period a sweeper will tick at
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Starts sweep tasks.
pub struct Sweeper;

impl Sweeper {
    /// Spawns a task that sweeps `store` every `interval`.
    ///
    /// The first sweep happens one full interval after start. An interval
    /// below 1ms is raised to 1ms. The task runs until
    /// [`SweeperHandle::stop`] is called or the runtime shuts down; dropping
    /// the handle does not stop it.
    ///
    /// # Example
    /// ```ignore
    /// let handle = Sweeper::start(service.store(), Duration::from_secs(60));
    /// // Later, during shutdown:
    /// handle.stop().await;
    /// ```
    pub fn start(store: SharedStore, interval: Duration) -> SweeperHandle {
        let interval = interval.max(MIN_SWEEP_INTERVAL);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            info!(
                interval_ms = interval.as_millis() as u64,
                "starting expiry sweeper"
            );

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() fires immediately; skip that tick
            ticker.tick().await;

            // Set once the handle is dropped without stop(); the sweeper then
            // keeps running for the life of the runtime.
            let mut detached = false;

            loop {
                tokio::select! {
                    signal = &mut stop_rx, if !detached => {
                        if signal.is_ok() {
                            break;
                        }
                        detached = true;
                        continue;
                    }
                    _ = ticker.tick() => {}
                }

                let removed = store.write().await.sweep(current_timestamp_ms());

                if removed > 0 {
                    info!(removed, "swept expired counters");
                } else {
                    debug!("sweep found no expired counters");
                }
            }

            info!("expiry sweeper stopped");
        });

        SweeperHandle {
            stop_tx: Some(stop_tx),
            task,
        }
    }
}

// == Sweeper Handle ==
/// Controls a running sweeper.
#[derive(Debug)]
pub struct SweeperHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the sweeper to stop and waits for it to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!(error = %e, "expiry sweeper exited abnormally");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}
