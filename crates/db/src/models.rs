use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Channel {
    pub id: i32,
    /// Stable numeric id assigned by Telegram; the key everything else
    /// references.
    pub tg_id: i64,
    pub username: Option<String>,
    pub title: String,
    pub participants_count: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_parsed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub channel_id: i64,
    pub post_id: i64,
    pub message: String,
    pub date: DateTime<Utc>,
    pub views: Option<i32>,
    pub comments_count: i32,
    pub topics: Vec<String>,
    pub problem_probability: Option<f64>,
    pub problem_confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}
