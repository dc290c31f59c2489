use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable channel metadata as resolved by the Telegram gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub tg_id: i64,
    pub username: Option<String>,
    pub title: String,
    pub participants_count: Option<i32>,
}

/// A stored channel as seen by the orchestrator; the link used for the next
/// fetch is derived from the username when present, the numeric id otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub tg_id: i64,
    pub username: Option<String>,
    pub title: String,
}

impl ChannelRecord {
    pub fn link(&self) -> String {
        match &self.username {
            Some(username) => format!("https://t.me/{username}"),
            None => self.tg_id.to_string(),
        }
    }
}

/// A single text post as returned by the fetcher, before classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedPost {
    pub post_id: i64,
    pub message: String,
    pub date: DateTime<Utc>,
    pub views: Option<i32>,
    pub comments_count: i32,
}

/// A classified post ready for insertion, keyed by (channel_id, post_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPost {
    pub channel_id: i64,
    pub post_id: i64,
    pub message: String,
    pub date: DateTime<Utc>,
    pub views: Option<i32>,
    pub comments_count: i32,
    pub topics: Vec<String>,
    pub problem_probability: Option<f64>,
    pub problem_confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Completed,
    NoNewPosts,
    Failed,
}

/// Result of one channel's fetch/classify/persist pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelOutcome {
    pub channel: String,
    pub posts_parsed: usize,
    pub posts_saved: u64,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl ChannelOutcome {
    pub fn failed(channel: String, kind: &str, error: String) -> Self {
        Self {
            channel,
            posts_parsed: 0,
            posts_saved: 0,
            status: OutcomeStatus::Failed,
            error: Some(error),
            error_kind: Some(kind.to_string()),
        }
    }
}

/// Aggregate over one full orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSummary {
    pub channels_total: usize,
    pub channels_succeeded: usize,
    pub channels_failed: usize,
    pub posts_parsed: usize,
    pub posts_saved: u64,
    pub outcomes: Vec<ChannelOutcome>,
}

impl CycleSummary {
    pub fn from_outcomes(channels_total: usize, outcomes: Vec<ChannelOutcome>) -> Self {
        let channels_failed = outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Failed)
            .count();
        Self {
            channels_total,
            channels_succeeded: outcomes.len() - channels_failed,
            channels_failed,
            posts_parsed: outcomes.iter().map(|o| o.posts_parsed).sum(),
            posts_saved: outcomes.iter().map(|o| o.posts_saved).sum(),
            outcomes,
        }
    }
}

/// Work unit carried over the Redis queue from the API to the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerJob {
    /// Iterate every known channel and fetch above its cursor.
    FullCycle,
    /// Resolve and parse a single channel, creating it if new.
    AddChannel { link: String },
    /// Summarize free-form text through the external completion service.
    Summarize { text: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: String,
    pub job: WorkerJob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl JobStatus {
    pub fn new(state: JobState) -> Self {
        Self {
            state,
            result: None,
            error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn completed(result: serde_json::Value) -> Self {
        Self {
            state: JobState::Completed,
            result: Some(result),
            error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            state: JobState::Failed,
            result: None,
            error: Some(error),
            updated_at: Utc::now(),
        }
    }
}
