use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use telepulse_core::ParseError;

pub type Result<T> = std::result::Result<T, TelegramError>;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("entity is not a broadcast channel: {0}")]
    NotAChannel(String),

    #[error("flood wait, retry after {0:?}")]
    FloodWait(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("gateway error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        TelegramError::Network(err.to_string())
    }
}

impl From<TelegramError> for ParseError {
    fn from(err: TelegramError) -> Self {
        match err {
            TelegramError::NotFound(id) | TelegramError::NotAChannel(id) => {
                ParseError::ChannelNotFound(id)
            }
            TelegramError::FloodWait(retry_after) => ParseError::RateLimited { retry_after },
            other => ParseError::Other(anyhow::Error::new(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Channel,
    Group,
    User,
}

/// A resolved Telegram entity as reported by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelEntity {
    pub tg_id: i64,
    pub username: Option<String>,
    pub title: String,
    pub participants_count: Option<i32>,
    pub kind: EntityKind,
}

/// One raw message from a channel history page. `text` is absent for media
/// and service messages.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    pub id: i64,
    pub text: Option<String>,
    pub date: DateTime<Utc>,
    pub views: Option<i32>,
    #[serde(default)]
    pub replies: i32,
}

/// The consumed Telegram interface. The underlying MTProto connection lives
/// in an external gateway sidecar; this crate never manages it.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    /// Resolves a username, numeric id, or invite hash to an entity.
    async fn resolve(&self, identifier: &str) -> Result<ChannelEntity>;

    /// Returns up to `limit` messages of a channel's history, newest first,
    /// strictly below `offset_id` when given.
    async fn messages(
        &self,
        tg_id: i64,
        offset_id: Option<i64>,
        limit: u32,
    ) -> Result<Vec<RawMessage>>;
}

/// HTTP client for the Telegram gateway sidecar.
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GatewayClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.get(format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn check(resp: reqwest::Response, subject: &str) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status.as_u16() == 404 {
            return Err(TelegramError::NotFound(subject.to_string()));
        }
        if status.as_u16() == 429 {
            let wait = resp
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(TelegramError::FloodWait(Duration::from_secs(wait)));
        }
        let message = resp.text().await.unwrap_or_default();
        Err(TelegramError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl TelegramApi for GatewayClient {
    async fn resolve(&self, identifier: &str) -> Result<ChannelEntity> {
        let resp = self.get(&format!("/channels/{identifier}")).send().await?;
        let resp = Self::check(resp, identifier).await?;
        Ok(resp.json::<ChannelEntity>().await?)
    }

    async fn messages(
        &self,
        tg_id: i64,
        offset_id: Option<i64>,
        limit: u32,
    ) -> Result<Vec<RawMessage>> {
        let mut req = self
            .get(&format!("/channels/{tg_id}/messages"))
            .query(&[("limit", limit.to_string())]);
        if let Some(offset_id) = offset_id {
            req = req.query(&[("offset_id", offset_id.to_string())]);
        }
        let resp = req.send().await?;
        let resp = Self::check(resp, &tg_id.to_string()).await?;
        Ok(resp.json::<Vec<RawMessage>>().await?)
    }
}
