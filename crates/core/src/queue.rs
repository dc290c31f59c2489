use std::time::Duration;

use anyhow::Context;
use redis::AsyncCommands;

use crate::types::{JobState, JobStatus, WorkerJob, QueuedJob};

const JOBS_KEY: &str = "telepulse:jobs";
const STATUS_TTL_SECS: u64 = 86_400;

/// Redis-backed job queue shared by the API (producer) and the worker
/// (consumer). Jobs travel as JSON on a list; each job keeps a status key
/// with a one-day TTL for lookup by id.
#[derive(Clone)]
pub struct JobQueue {
    client: redis::Client,
}

impl JobQueue {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    pub fn open(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url).context("invalid redis url")?;
        Ok(Self { client })
    }

    pub async fn enqueue(&self, job: WorkerJob) -> anyhow::Result<String> {
        let queued = QueuedJob {
            id: format!("job_{}", nanoid::nanoid!(12)),
            job,
        };
        let payload = serde_json::to_string(&queued)?;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.lpush(JOBS_KEY, payload).await?;
        self.write_status(&mut conn, &queued.id, &JobStatus::new(JobState::Queued))
            .await?;
        Ok(queued.id)
    }

    /// Blocks up to `timeout` for the next job; `None` on timeout.
    pub async fn dequeue(&self, timeout: Duration) -> anyhow::Result<Option<QueuedJob>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let popped: Option<(String, String)> =
            conn.brpop(JOBS_KEY, timeout.as_secs_f64()).await?;
        match popped {
            Some((_, payload)) => {
                let queued: QueuedJob =
                    serde_json::from_str(&payload).context("malformed queued job")?;
                Ok(Some(queued))
            }
            None => Ok(None),
        }
    }

    pub async fn set_status(&self, job_id: &str, status: &JobStatus) -> anyhow::Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        self.write_status(&mut conn, job_id, status).await
    }

    pub async fn status(&self, job_id: &str) -> anyhow::Result<Option<JobStatus>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(status_key(job_id)).await?;
        match raw {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw).context("malformed job status")?,
            )),
            None => Ok(None),
        }
    }

    async fn write_status(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        job_id: &str,
        status: &JobStatus,
    ) -> anyhow::Result<()> {
        let payload = serde_json::to_string(status)?;
        let _: () = conn
            .set_ex(status_key(job_id), payload, STATUS_TTL_SECS)
            .await?;
        Ok(())
    }
}

fn status_key(job_id: &str) -> String {
    format!("telepulse:job:{job_id}")
}
