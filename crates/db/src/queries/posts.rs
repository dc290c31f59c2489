use chrono::NaiveDate;
use sqlx::{PgPool, QueryBuilder};

use crate::models::Post;
use telepulse_core::types::NewPost;

const POST_COLUMNS: &str = "id, channel_id, post_id, message, date, views, comments_count, \
     topics, problem_probability, problem_confidence, created_at";

/// Bulk insert keyed by (channel_id, post_id); conflicting rows are skipped,
/// never overwritten. Returns the number of rows actually inserted
/// (conflicts excluded), not the attempted batch size.
pub async fn bulk_insert(pool: &PgPool, posts: &[NewPost]) -> Result<u64, sqlx::Error> {
    if posts.is_empty() {
        return Ok(0);
    }

    let mut qb = QueryBuilder::new(
        "INSERT INTO posts (channel_id, post_id, message, date, views, comments_count, \
         topics, problem_probability, problem_confidence) ",
    );
    qb.push_values(posts, |mut row, post| {
        row.push_bind(post.channel_id)
            .push_bind(post.post_id)
            .push_bind(&post.message)
            .push_bind(post.date)
            .push_bind(post.views)
            .push_bind(post.comments_count)
            .push_bind(&post.topics)
            .push_bind(post.problem_probability)
            .push_bind(post.problem_confidence);
    });
    qb.push(" ON CONFLICT (channel_id, post_id) DO NOTHING");

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected())
}

/// Highest stored post id for a channel, the implicit fetch cursor.
pub async fn last_post_id(pool: &PgPool, channel_id: i64) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(post_id) FROM posts WHERE channel_id = $1")
        .bind(channel_id)
        .fetch_one(pool)
        .await
}

pub async fn get_last_post(pool: &PgPool, channel_id: i64) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE channel_id = $1 ORDER BY post_id DESC LIMIT 1"
    ))
    .bind(channel_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_recent(
    pool: &PgPool,
    channel_id: i64,
    limit: i64,
) -> Result<Vec<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE channel_id = $1 ORDER BY date DESC LIMIT $2"
    ))
    .bind(channel_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn counts_by_date(
    pool: &PgPool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<(NaiveDate, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (NaiveDate, i64)>(
        r#"
        SELECT date::date AS day, COUNT(*) AS posts
        FROM posts
        WHERE date::date BETWEEN $1 AND $2
        GROUP BY day
        ORDER BY day
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

pub async fn counts_by_topic(
    pool: &PgPool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT t.topic, COUNT(*) AS posts
        FROM posts p
        CROSS JOIN LATERAL unnest(p.topics) AS t(topic)
        WHERE p.date::date BETWEEN $1 AND $2
        GROUP BY t.topic
        ORDER BY posts DESC
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}
