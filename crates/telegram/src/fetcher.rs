use std::time::Duration;

use tracing::debug;

use telepulse_core::link::normalize_link;
use telepulse_core::types::{ChannelInfo, FetchedPost};
use telepulse_core::ParseError;

use crate::client::{EntityKind, TelegramApi};

/// Lower bound for an incremental fetch. Messages at or below
/// `last_post_id`, or dated at or before `since_date`, are not returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchBounds {
    pub last_post_id: Option<i64>,
    pub since_date: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Maximum number of accepted posts per fetch.
    pub limit: usize,
    /// Pause after each accepted message, to stay under gateway rate limits.
    pub delay: Duration,
    /// History page size requested from the gateway.
    pub page_size: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            limit: 100,
            delay: Duration::from_millis(100),
            page_size: 100,
        }
    }
}

/// Resolves a free-form channel link to stable metadata. Read-only.
pub async fn channel_info(api: &dyn TelegramApi, link: &str) -> Result<ChannelInfo, ParseError> {
    let identifier = normalize_link(link)?;
    let entity = api.resolve(&identifier).await?;

    if entity.kind != EntityKind::Channel {
        return Err(ParseError::ChannelNotFound(format!(
            "{link} is not a broadcast channel"
        )));
    }

    Ok(ChannelInfo {
        tg_id: entity.tg_id,
        username: entity.username,
        title: entity.title,
        participants_count: entity.participants_count,
    })
}

/// Walks a channel's history newest-first, keeping text messages above the
/// bounds until `limit` posts are collected or the boundary is reached.
/// Returns posts in chronological order.
///
/// Any mid-page failure discards the partial page: the cursor is derived
/// from stored rows, so the next run refetches the same window and the
/// conflict-skip insert makes the retry safe.
pub async fn fetch_posts(
    api: &dyn TelegramApi,
    tg_id: i64,
    bounds: &FetchBounds,
    opts: &FetchOptions,
) -> Result<Vec<FetchedPost>, ParseError> {
    let mut collected: Vec<FetchedPost> = Vec::new();
    let mut offset_id: Option<i64> = None;

    'pages: loop {
        let page = api.messages(tg_id, offset_id, opts.page_size).await?;
        if page.is_empty() {
            break;
        }
        let page_len = page.len();

        for msg in page {
            offset_id = Some(msg.id);

            if let Some(last) = bounds.last_post_id {
                if msg.id <= last {
                    break 'pages;
                }
            }

            // Walking newest-first, dates only decrease; the first message at
            // or before the since bound ends the walk.
            if let Some(since) = bounds.since_date {
                if msg.date <= since {
                    break 'pages;
                }
            }

            let text = match msg.text.as_deref().map(str::trim) {
                Some(text) if !text.is_empty() => text.to_string(),
                _ => continue,
            };

            collected.push(FetchedPost {
                post_id: msg.id,
                message: text,
                date: msg.date,
                views: msg.views,
                comments_count: msg.replies,
            });

            if collected.len() >= opts.limit {
                break 'pages;
            }
            if !opts.delay.is_zero() {
                tokio::time::sleep(opts.delay).await;
            }
        }

        if page_len < opts.page_size as usize {
            break;
        }
    }

    debug!(tg_id, posts = collected.len(), "fetched channel history");

    // Oldest first, so persistence sees them in publication order.
    collected.reverse();
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ChannelEntity, RawMessage, TelegramError};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    enum FailMode {
        None,
        /// Raise a flood wait after serving this many messages.
        FloodAfter(usize),
        /// Raise a generic gateway error after serving this many messages.
        FaultAfter(usize),
    }

    struct MockApi {
        entity: ChannelEntity,
        /// Newest first, as the gateway would return them.
        messages: Vec<RawMessage>,
        served: Mutex<usize>,
        fail: FailMode,
    }

    impl MockApi {
        fn new(messages: Vec<RawMessage>) -> Self {
            Self {
                entity: ChannelEntity {
                    tg_id: 9000,
                    username: Some("citynews".to_string()),
                    title: "City News".to_string(),
                    participants_count: Some(1200),
                    kind: EntityKind::Channel,
                },
                messages,
                served: Mutex::new(0),
                fail: FailMode::None,
            }
        }

        fn failing(messages: Vec<RawMessage>, fail: FailMode) -> Self {
            Self {
                fail,
                ..Self::new(messages)
            }
        }
    }

    #[async_trait]
    impl TelegramApi for MockApi {
        async fn resolve(&self, identifier: &str) -> crate::client::Result<ChannelEntity> {
            if identifier == self.entity.username.as_deref().unwrap_or_default()
                || identifier == self.entity.tg_id.to_string()
            {
                Ok(self.entity.clone())
            } else {
                Err(TelegramError::NotFound(identifier.to_string()))
            }
        }

        async fn messages(
            &self,
            _tg_id: i64,
            offset_id: Option<i64>,
            limit: u32,
        ) -> crate::client::Result<Vec<RawMessage>> {
            let mut out = Vec::new();
            for msg in &self.messages {
                if let Some(offset) = offset_id {
                    if msg.id >= offset {
                        continue;
                    }
                }
                {
                    let mut served = self.served.lock().unwrap();
                    match self.fail {
                        FailMode::FloodAfter(n) if *served >= n => {
                            return Err(TelegramError::FloodWait(Duration::from_secs(30)));
                        }
                        FailMode::FaultAfter(n) if *served >= n => {
                            return Err(TelegramError::Api {
                                status: 502,
                                message: "gateway unavailable".to_string(),
                            });
                        }
                        _ => *served += 1,
                    }
                }
                out.push(msg.clone());
                if out.len() >= limit as usize {
                    break;
                }
            }
            Ok(out)
        }
    }

    fn msg(id: i64, text: Option<&str>) -> RawMessage {
        RawMessage {
            id,
            text: text.map(String::from),
            date: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, id as u32 % 60).unwrap(),
            views: Some(10 * id as i32),
            replies: 2,
        }
    }

    fn opts() -> FetchOptions {
        FetchOptions {
            limit: 100,
            delay: Duration::ZERO,
            page_size: 100,
        }
    }

    #[tokio::test]
    async fn resolves_channel_metadata() {
        let api = MockApi::new(vec![]);
        let info = channel_info(&api, "https://t.me/citynews").await.unwrap();
        assert_eq!(info.tg_id, 9000);
        assert_eq!(info.username.as_deref(), Some("citynews"));
        assert_eq!(info.participants_count, Some(1200));
    }

    #[tokio::test]
    async fn unknown_username_is_channel_not_found() {
        let api = MockApi::new(vec![]);
        let err = channel_info(&api, "@nosuch").await.unwrap_err();
        assert!(matches!(err, ParseError::ChannelNotFound(_)));
    }

    #[tokio::test]
    async fn non_channel_entity_is_channel_not_found() {
        let mut api = MockApi::new(vec![]);
        api.entity.kind = EntityKind::Group;
        let err = channel_info(&api, "@citynews").await.unwrap_err();
        assert!(matches!(err, ParseError::ChannelNotFound(_)));
    }

    #[tokio::test]
    async fn malformed_link_fails_before_any_network_call() {
        let api = MockApi::new(vec![]);
        let err = channel_info(&api, "https://example.com/x").await.unwrap_err();
        assert!(matches!(err, ParseError::InvalidLink(_)));
    }

    #[tokio::test]
    async fn no_boundary_returns_everything_chronologically() {
        let api = MockApi::new(vec![
            msg(103, Some("third")),
            msg(102, Some("second")),
            msg(101, Some("first")),
        ]);
        let posts = fetch_posts(&api, 9000, &FetchBounds::default(), &opts())
            .await
            .unwrap();
        let ids: Vec<i64> = posts.iter().map(|p| p.post_id).collect();
        assert_eq!(ids, vec![101, 102, 103]);
        assert_eq!(posts[0].message, "first");
    }

    #[tokio::test]
    async fn boundary_at_highest_stored_id_yields_nothing() {
        let api = MockApi::new(vec![
            msg(103, Some("third")),
            msg(102, Some("second")),
            msg(101, Some("first")),
        ]);
        let bounds = FetchBounds {
            last_post_id: Some(103),
            ..Default::default()
        };
        let posts = fetch_posts(&api, 9000, &bounds, &opts()).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn boundary_returns_only_newer_posts() {
        let api = MockApi::new(vec![
            msg(104, Some("fourth")),
            msg(103, Some("third")),
            msg(102, Some("second")),
            msg(101, Some("first")),
        ]);
        let bounds = FetchBounds {
            last_post_id: Some(103),
            ..Default::default()
        };
        let posts = fetch_posts(&api, 9000, &bounds, &opts()).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].post_id, 104);
    }

    #[tokio::test]
    async fn non_text_messages_are_discarded() {
        let api = MockApi::new(vec![
            msg(103, Some("text")),
            msg(102, None),
            msg(101, Some("   ")),
        ]);
        let posts = fetch_posts(&api, 9000, &FetchBounds::default(), &opts())
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].post_id, 103);
    }

    #[tokio::test]
    async fn since_date_skips_older_posts() {
        let api = MockApi::new(vec![msg(103, Some("new")), msg(101, Some("old"))]);
        let bounds = FetchBounds {
            since_date: Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 41).unwrap()),
            ..Default::default()
        };
        let posts = fetch_posts(&api, 9000, &bounds, &opts()).await.unwrap();
        let ids: Vec<i64> = posts.iter().map(|p| p.post_id).collect();
        assert_eq!(ids, vec![103]);
    }

    #[tokio::test]
    async fn since_date_ends_the_walk_without_further_paging() {
        // Ids 1..=5 carry strictly increasing dates; the bound sits at id 3.
        // Pages of two: [5, 4] is consumed, [3, 2] trips the bound, and the
        // oldest message is never requested from the gateway.
        let api = MockApi::new((1..=5).rev().map(|i| msg(i, Some("t"))).collect());
        let bounds = FetchBounds {
            since_date: Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 3).unwrap()),
            ..Default::default()
        };
        let posts = fetch_posts(
            &api,
            9000,
            &bounds,
            &FetchOptions {
                page_size: 2,
                ..opts()
            },
        )
        .await
        .unwrap();

        let ids: Vec<i64> = posts.iter().map(|p| p.post_id).collect();
        assert_eq!(ids, vec![4, 5]);
        assert_eq!(*api.served.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn limit_caps_the_page() {
        let api = MockApi::new((1..=10).rev().map(|i| msg(i, Some("t"))).collect());
        let posts = fetch_posts(
            &api,
            9000,
            &FetchBounds::default(),
            &FetchOptions {
                limit: 3,
                ..opts()
            },
        )
        .await
        .unwrap();
        assert_eq!(posts.len(), 3);
        // Newest three, oldest first.
        let ids: Vec<i64> = posts.iter().map(|p| p.post_id).collect();
        assert_eq!(ids, vec![8, 9, 10]);
    }

    #[tokio::test]
    async fn pages_through_history() {
        let api = MockApi::new((1..=25).rev().map(|i| msg(i, Some("t"))).collect());
        let posts = fetch_posts(
            &api,
            9000,
            &FetchBounds::default(),
            &FetchOptions {
                page_size: 10,
                ..opts()
            },
        )
        .await
        .unwrap();
        assert_eq!(posts.len(), 25);
        assert_eq!(posts.first().unwrap().post_id, 1);
        assert_eq!(posts.last().unwrap().post_id, 25);
    }

    #[tokio::test]
    async fn flood_wait_propagates_with_duration() {
        let api = MockApi::failing(
            (1..=5).rev().map(|i| msg(i, Some("t"))).collect(),
            FailMode::FloodAfter(2),
        );
        let err = fetch_posts(&api, 9000, &FetchBounds::default(), &opts())
            .await
            .unwrap_err();
        match err {
            ParseError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(30));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mid_page_fault_discards_partial_results() {
        // Two messages come through, then the gateway dies; the whole fetch
        // fails and nothing is handed to persistence.
        let api = MockApi::failing(
            (1..=5).rev().map(|i| msg(i, Some("t"))).collect(),
            FailMode::FaultAfter(2),
        );
        let result = fetch_posts(&api, 9000, &FetchBounds::default(), &opts()).await;
        assert!(matches!(result, Err(ParseError::Other(_))));
    }
}
