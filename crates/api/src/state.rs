use std::sync::Arc;

use sqlx::PgPool;

use telepulse_core::queue::JobQueue;
use telepulse_summarize::SummarizeClient;
use telepulse_telegram::TelegramApi;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub queue: JobQueue,
    pub telegram: Arc<dyn TelegramApi>,
    pub summarizer: Arc<SummarizeClient>,
    pub telepulse_env: String,
}

#[derive(Debug, Clone)]
pub struct RequestId(pub String);
