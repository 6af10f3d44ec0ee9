//! Pipeline scheduler
//!
//! Ticks at a fixed interval and asks the pipeline registry to promote every
//! Pending pipeline whose scheduled time has passed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::service::pipeline::PipelineRegistry;

/// Handle to a running scheduler loop
pub struct PipelineScheduler {
    shutdown: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl PipelineScheduler {
    /// Spawn the loop; it owns a sender on the pipeline queue until stopped
    pub(crate) fn spawn(
        registry: Arc<PipelineRegistry>,
        queue: mpsc::Sender<String>,
        interval: Duration,
    ) -> Self {
        let (shutdown, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(run(registry, queue, interval, shutdown_rx));
        Self { shutdown, handle }
    }

    /// Stop ticking and wait for the loop to exit
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.handle.await {
            error!("Scheduler task panicked: {}", e);
        }
    }
}

async fn run(
    registry: Arc<PipelineRegistry>,
    queue: mpsc::Sender<String>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!("Starting pipeline scheduler (interval: {:?})", interval);

    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let promoted = registry.promote_due(&queue, Utc::now()).await;
                if promoted > 0 {
                    debug!("Promoted {} pipeline(s) this tick", promoted);
                }
            }
            _ = shutdown.recv() => {
                break;
            }
        }
    }

    info!("Pipeline scheduler stopped");
}
