pub mod parse;

use std::sync::Arc;

use tracing::{info, warn};

use telepulse_core::queue::JobQueue;
use telepulse_core::types::{JobState, JobStatus, QueuedJob, WorkerJob};
use telepulse_summarize::SummarizeClient;

pub use parse::ParseContext;

/// Executes one queued job and records its lifecycle in the status store.
pub async fn run_job(
    ctx: Arc<ParseContext>,
    summarizer: &SummarizeClient,
    queue: &JobQueue,
    queued: QueuedJob,
) {
    info!(job_id = %queued.id, "job started");
    if let Err(err) = queue
        .set_status(&queued.id, &JobStatus::new(JobState::Running))
        .await
    {
        warn!(job_id = %queued.id, %err, "failed to mark job running");
    }

    let status = match &queued.job {
        WorkerJob::FullCycle => match parse::parse_all_channels(Arc::clone(&ctx)).await {
            Ok(summary) => JobStatus::completed(
                serde_json::to_value(&summary).unwrap_or(serde_json::Value::Null),
            ),
            Err(err) => JobStatus::failed(err.to_string()),
        },
        WorkerJob::AddChannel { link } => match parse::parse_channel(&ctx, link).await {
            Ok(outcome) => JobStatus::completed(
                serde_json::to_value(&outcome).unwrap_or(serde_json::Value::Null),
            ),
            Err(err) => JobStatus::failed(err.to_string()),
        },
        WorkerJob::Summarize { text } => match summarizer.summarize(text).await {
            Ok(summary) => JobStatus::completed(serde_json::json!({ "summary": summary })),
            Err(err) => JobStatus::failed(err.to_string()),
        },
    };

    info!(job_id = %queued.id, state = ?status.state, "job finished");
    if let Err(err) = queue.set_status(&queued.id, &status).await {
        warn!(job_id = %queued.id, %err, "failed to record job result");
    }
}
