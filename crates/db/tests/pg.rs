//! Live-Postgres integration tests. Run with a scratch database:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/telepulse_test cargo test -p telepulse-db -- --ignored
//! ```

use chrono::{TimeZone, Utc};
use telepulse_core::types::{ChannelInfo, NewPost};
use telepulse_db::{queries, PgPool};

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for live tests");
    let pool = telepulse_db::connect(&url, 2).await.expect("connect");
    telepulse_db::migrate(&pool).await.expect("migrate");
    pool
}

fn unique_tg_id() -> i64 {
    // Distinct per test run so reruns against the same database stay green.
    Utc::now().timestamp_micros()
}

fn info(tg_id: i64, title: &str, participants: Option<i32>) -> ChannelInfo {
    ChannelInfo {
        tg_id,
        username: Some(format!("chan_{tg_id}")),
        title: title.to_string(),
        participants_count: participants,
    }
}

fn post(channel_id: i64, post_id: i64, message: &str) -> NewPost {
    NewPost {
        channel_id,
        post_id,
        message: message.to_string(),
        date: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        views: Some(5),
        comments_count: 1,
        topics: vec!["environment".to_string()],
        problem_probability: Some(0.8),
        problem_confidence: Some(0.6),
    }
}

#[tokio::test]
#[ignore]
async fn upsert_twice_keeps_one_row_with_latest_fields() {
    let pool = pool().await;
    let tg_id = unique_tg_id();

    let first = queries::channels::upsert(&pool, &info(tg_id, "Old title", Some(10)))
        .await
        .unwrap();
    let second = queries::channels::upsert(&pool, &info(tg_id, "New title", Some(25)))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.title, "New title");
    assert_eq!(second.participants_count, Some(25));
    assert!(second.updated_at >= first.updated_at);
}

#[tokio::test]
#[ignore]
async fn duplicate_post_pair_inserts_exactly_one_row() {
    let pool = pool().await;
    let tg_id = unique_tg_id();
    queries::channels::upsert(&pool, &info(tg_id, "Chan", None))
        .await
        .unwrap();

    let batch = vec![post(tg_id, 101, "first write")];
    let inserted = queries::posts::bulk_insert(&pool, &batch).await.unwrap();
    assert_eq!(inserted, 1);

    // Second write for the same (channel, post) pair is skipped; the stored
    // message keeps the first write.
    let dup = vec![post(tg_id, 101, "second write")];
    let inserted = queries::posts::bulk_insert(&pool, &dup).await.unwrap();
    assert_eq!(inserted, 0);

    let stored = queries::posts::get_last_post(&pool, tg_id).await.unwrap().unwrap();
    assert_eq!(stored.message, "first write");
}

#[tokio::test]
#[ignore]
async fn mixed_batch_reports_only_new_rows() {
    let pool = pool().await;
    let tg_id = unique_tg_id();
    queries::channels::upsert(&pool, &info(tg_id, "Chan", None))
        .await
        .unwrap();

    queries::posts::bulk_insert(&pool, &[post(tg_id, 101, "a")])
        .await
        .unwrap();

    let batch = vec![post(tg_id, 101, "a"), post(tg_id, 102, "b"), post(tg_id, 103, "c")];
    let inserted = queries::posts::bulk_insert(&pool, &batch).await.unwrap();
    assert_eq!(inserted, 2);
}

#[tokio::test]
#[ignore]
async fn cursor_is_highest_stored_post_id() {
    let pool = pool().await;
    let tg_id = unique_tg_id();
    queries::channels::upsert(&pool, &info(tg_id, "Chan", None))
        .await
        .unwrap();

    assert_eq!(queries::posts::last_post_id(&pool, tg_id).await.unwrap(), None);

    let batch = vec![post(tg_id, 101, "a"), post(tg_id, 103, "c"), post(tg_id, 102, "b")];
    queries::posts::bulk_insert(&pool, &batch).await.unwrap();

    assert_eq!(
        queries::posts::last_post_id(&pool, tg_id).await.unwrap(),
        Some(103)
    );
}

#[tokio::test]
#[ignore]
async fn last_parsed_timestamp_is_updated() {
    let pool = pool().await;
    let tg_id = unique_tg_id();
    let channel = queries::channels::upsert(&pool, &info(tg_id, "Chan", None))
        .await
        .unwrap();
    assert!(channel.last_parsed_at.is_none());

    let when = Utc::now();
    queries::channels::update_last_parsed(&pool, tg_id, when)
        .await
        .unwrap();

    let channel = queries::channels::get_by_tg_id(&pool, tg_id)
        .await
        .unwrap()
        .unwrap();
    let parsed = channel.last_parsed_at.expect("last_parsed_at set");
    assert!((parsed - when).num_seconds().abs() < 2);
}
