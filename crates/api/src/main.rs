use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware::from_fn, Router};
use tokio::net::TcpListener;
use tracing::info;

use telepulse_core::config::Settings;
use telepulse_core::queue::JobQueue;
use telepulse_summarize::SummarizeClient;
use telepulse_telegram::{GatewayClient, TelegramApi};

mod error;
mod middleware;
mod routes;
mod state;

use crate::middleware::request_id::request_id;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let settings = Settings::from_env()?;

    let db = telepulse_db::connect(&settings.database_url, 10).await?;
    telepulse_db::migrate(&db).await?;

    let queue = JobQueue::open(&settings.redis_url)?;
    let telegram: Arc<dyn TelegramApi> = Arc::new(GatewayClient::new(
        &settings.gateway_url,
        settings.gateway_token.as_deref(),
    ));

    let summarizer = Arc::new(SummarizeClient::new(
        &settings.summarizer_url,
        settings.summarizer_token.as_deref(),
        &settings.summarizer_model,
    ));

    let state = AppState {
        db,
        queue,
        telegram,
        summarizer,
        telepulse_env: settings.telepulse_env.clone(),
    };

    let app = Router::new()
        .merge(routes::health_router(state.clone()))
        .merge(routes::v1_router(state))
        .layer(from_fn(request_id));

    let addr: SocketAddr = settings.api_bind.parse()?;

    info!(%addr, env = %settings.telepulse_env, "starting api");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
