use async_trait::async_trait;
use chrono::{DateTime, Utc};

use telepulse_core::types::{ChannelInfo, ChannelRecord, NewPost};
use telepulse_db::{queries, PgPool};

/// Persistence seam for the orchestrator. Production goes through Postgres;
/// tests swap in an in-memory implementation.
#[async_trait]
pub trait Store: Send + Sync {
    async fn upsert_channel(&self, info: &ChannelInfo) -> anyhow::Result<()>;
    async fn list_channels(&self) -> anyhow::Result<Vec<ChannelRecord>>;
    async fn last_post_id(&self, channel_id: i64) -> anyhow::Result<Option<i64>>;
    /// Conflict-skip insert; returns rows actually inserted.
    async fn insert_posts(&self, posts: &[NewPost]) -> anyhow::Result<u64>;
    async fn mark_parsed(&self, channel_id: i64, when: DateTime<Utc>) -> anyhow::Result<()>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_channel(&self, info: &ChannelInfo) -> anyhow::Result<()> {
        queries::channels::upsert(&self.pool, info).await?;
        Ok(())
    }

    async fn list_channels(&self) -> anyhow::Result<Vec<ChannelRecord>> {
        let channels = queries::channels::list_all(&self.pool).await?;
        Ok(channels
            .into_iter()
            .map(|c| ChannelRecord {
                tg_id: c.tg_id,
                username: c.username,
                title: c.title,
            })
            .collect())
    }

    async fn last_post_id(&self, channel_id: i64) -> anyhow::Result<Option<i64>> {
        Ok(queries::posts::last_post_id(&self.pool, channel_id).await?)
    }

    async fn insert_posts(&self, posts: &[NewPost]) -> anyhow::Result<u64> {
        Ok(queries::posts::bulk_insert(&self.pool, posts).await?)
    }

    async fn mark_parsed(&self, channel_id: i64, when: DateTime<Utc>) -> anyhow::Result<()> {
        queries::channels::update_last_parsed(&self.pool, channel_id, when).await?;
        Ok(())
    }
}
