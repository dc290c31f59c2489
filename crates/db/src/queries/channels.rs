use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::Channel;
use telepulse_core::types::ChannelInfo;

const CHANNEL_COLUMNS: &str = "id, tg_id, username, title, participants_count, \
     created_at, updated_at, last_parsed_at";

/// Inserts or refreshes a channel keyed by its Telegram id. All mutable
/// metadata plus `updated_at` are rewritten on conflict; idempotent.
pub async fn upsert(pool: &PgPool, info: &ChannelInfo) -> Result<Channel, sqlx::Error> {
    sqlx::query_as::<_, Channel>(&format!(
        r#"
        INSERT INTO channels (tg_id, username, title, participants_count)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (tg_id) DO UPDATE
        SET username = EXCLUDED.username,
            title = EXCLUDED.title,
            participants_count = EXCLUDED.participants_count,
            updated_at = now()
        RETURNING {CHANNEL_COLUMNS}
        "#
    ))
    .bind(info.tg_id)
    .bind(&info.username)
    .bind(&info.title)
    .bind(info.participants_count)
    .fetch_one(pool)
    .await
}

pub async fn get_by_tg_id(pool: &PgPool, tg_id: i64) -> Result<Option<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>(&format!(
        "SELECT {CHANNEL_COLUMNS} FROM channels WHERE tg_id = $1"
    ))
    .bind(tg_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_by_username(pool: &PgPool, username: &str) -> Result<Option<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>(&format!(
        "SELECT {CHANNEL_COLUMNS} FROM channels WHERE username = $1"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>(&format!(
        "SELECT {CHANNEL_COLUMNS} FROM channels ORDER BY created_at"
    ))
    .fetch_all(pool)
    .await
}

pub async fn update_last_parsed(
    pool: &PgPool,
    tg_id: i64,
    when: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE channels SET last_parsed_at = $1 WHERE tg_id = $2")
        .bind(when)
        .bind(tg_id)
        .execute(pool)
        .await?;
    Ok(())
}
