use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub redis_url: String,
    pub telepulse_env: String,
    pub api_bind: String,
    pub gateway_url: String,
    pub gateway_token: Option<String>,
    pub summarizer_url: String,
    pub summarizer_token: Option<String>,
    pub summarizer_model: String,
    pub topic_model_path: String,
    pub problem_model_path: String,
    pub fetch_limit: usize,
    pub fetch_delay_ms: u64,
    pub fetch_page_size: u32,
    pub channel_concurrency: usize,
    pub parse_interval_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self, std::env::VarError> {
        let database_url =
            std::env::var("DATABASE_URL").or_else(|_| std::env::var("TELEPULSE_DATABASE_URL"))?;
        let redis_url =
            std::env::var("REDIS_URL").or_else(|_| std::env::var("TELEPULSE_REDIS_URL"))?;
        let telepulse_env = std::env::var("TELEPULSE_ENV").unwrap_or_else(|_| "dev".to_string());
        let api_bind =
            std::env::var("TELEPULSE_API_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let gateway_url = std::env::var("TELEPULSE_GATEWAY_URL")
            .unwrap_or_else(|_| "http://localhost:8081".to_string());
        let gateway_token = std::env::var("TELEPULSE_GATEWAY_TOKEN").ok();
        let summarizer_url = std::env::var("TELEPULSE_SUMMARIZER_URL")
            .unwrap_or_else(|_| "http://localhost:8082".to_string());
        let summarizer_token = std::env::var("TELEPULSE_SUMMARIZER_TOKEN").ok();
        let summarizer_model = std::env::var("TELEPULSE_SUMMARIZER_MODEL")
            .unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let topic_model_path = std::env::var("TELEPULSE_TOPIC_MODEL")
            .unwrap_or_else(|_| "models/topics.json".to_string());
        let problem_model_path = std::env::var("TELEPULSE_PROBLEM_MODEL")
            .unwrap_or_else(|_| "models/problem.json".to_string());
        let fetch_limit = std::env::var("TELEPULSE_FETCH_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);
        let fetch_delay_ms = std::env::var("TELEPULSE_FETCH_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);
        let fetch_page_size = std::env::var("TELEPULSE_FETCH_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);
        let channel_concurrency = std::env::var("TELEPULSE_CHANNEL_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        let parse_interval_secs = std::env::var("TELEPULSE_PARSE_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(900);

        Ok(Self {
            database_url,
            redis_url,
            telepulse_env,
            api_bind,
            gateway_url,
            gateway_token,
            summarizer_url,
            summarizer_token,
            summarizer_model,
            topic_model_path,
            problem_model_path,
            fetch_limit,
            fetch_delay_ms,
            fetch_page_size,
            channel_concurrency,
            parse_interval_secs,
        })
    }
}
