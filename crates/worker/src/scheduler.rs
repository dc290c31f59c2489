use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use telepulse_core::queue::JobQueue;
use telepulse_core::types::WorkerJob;

/// Enqueues a full parse cycle on a fixed interval. The first tick fires
/// immediately, so a fresh deployment starts catching up right away.
pub async fn run(queue: JobQueue, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match queue.enqueue(WorkerJob::FullCycle).await {
            Ok(job_id) => info!(%job_id, "scheduled full parse cycle"),
            Err(err) => warn!(%err, "failed to schedule parse cycle"),
        }
    }
}
