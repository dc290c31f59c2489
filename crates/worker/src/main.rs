use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use telepulse_classify::{ProblemClassifier, TopicClassifier};
use telepulse_core::config::Settings;
use telepulse_core::queue::JobQueue;
use telepulse_summarize::SummarizeClient;
use telepulse_telegram::{FetchOptions, GatewayClient, TelegramApi};

mod jobs;
mod scheduler;
mod store;

use crate::jobs::ParseContext;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let settings = Settings::from_env()?;

    let pool = telepulse_db::connect(&settings.database_url, 5).await?;
    telepulse_db::migrate(&pool).await?;

    let queue = JobQueue::open(&settings.redis_url)?;

    let telegram: Arc<dyn TelegramApi> = Arc::new(GatewayClient::new(
        &settings.gateway_url,
        settings.gateway_token.as_deref(),
    ));
    let summarizer = SummarizeClient::new(
        &settings.summarizer_url,
        settings.summarizer_token.as_deref(),
        &settings.summarizer_model,
    );
    let topics = Arc::new(TopicClassifier::load(&settings.topic_model_path)?);
    let problems = Arc::new(ProblemClassifier::load(&settings.problem_model_path)?);

    let ctx = Arc::new(ParseContext {
        store: Arc::new(PgStore::new(pool)),
        telegram,
        topics,
        problems,
        options: FetchOptions {
            limit: settings.fetch_limit,
            delay: Duration::from_millis(settings.fetch_delay_ms),
            page_size: settings.fetch_page_size,
        },
        channel_concurrency: settings.channel_concurrency,
    });

    tokio::spawn(scheduler::run(
        queue.clone(),
        Duration::from_secs(settings.parse_interval_secs),
    ));

    info!("worker started");

    loop {
        match queue.dequeue(Duration::from_secs(5)).await {
            Ok(Some(job)) => jobs::run_job(Arc::clone(&ctx), &summarizer, &queue, job).await,
            Ok(None) => {}
            Err(err) => {
                warn!(%err, "queue poll failed");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
