use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use telepulse_classify::{ProblemClassifier, TopicClassifier};
use telepulse_core::fanout;
use telepulse_core::types::{
    ChannelOutcome, ChannelRecord, CycleSummary, FetchedPost, NewPost, OutcomeStatus,
};
use telepulse_core::ParseError;
use telepulse_telegram::fetcher::{self, FetchBounds, FetchOptions};
use telepulse_telegram::TelegramApi;

use crate::store::Store;

/// Everything one orchestration run needs, constructed explicitly at worker
/// start and shared across channel tasks.
pub struct ParseContext {
    pub store: Arc<dyn Store>,
    pub telegram: Arc<dyn TelegramApi>,
    pub topics: Arc<TopicClassifier>,
    pub problems: Arc<ProblemClassifier>,
    pub options: FetchOptions,
    pub channel_concurrency: usize,
}

/// One channel's full pass: resolve metadata, upsert the channel, fetch
/// above the stored cursor, classify, bulk-insert, stamp `last_parsed_at`.
pub async fn parse_channel(ctx: &ParseContext, link: &str) -> Result<ChannelOutcome, ParseError> {
    let info = fetcher::channel_info(ctx.telegram.as_ref(), link).await?;
    ctx.store.upsert_channel(&info).await?;

    let cursor = ctx.store.last_post_id(info.tg_id).await?;
    let bounds = FetchBounds {
        last_post_id: cursor,
        since_date: None,
    };
    let fetched = fetcher::fetch_posts(ctx.telegram.as_ref(), info.tg_id, &bounds, &ctx.options)
        .await?;
    let posts_parsed = fetched.len();

    let new_posts: Vec<NewPost> = fetched
        .into_iter()
        .map(|post| classify_post(ctx, info.tg_id, post))
        .collect();
    let posts_saved = ctx.store.insert_posts(&new_posts).await?;

    ctx.store.mark_parsed(info.tg_id, Utc::now()).await?;

    let channel = info.username.unwrap_or(info.title);
    info!(%channel, posts_parsed, posts_saved, "channel parsed");

    Ok(ChannelOutcome {
        channel,
        posts_parsed,
        posts_saved,
        status: if posts_saved > 0 {
            OutcomeStatus::Completed
        } else {
            OutcomeStatus::NoNewPosts
        },
        error: None,
        error_kind: None,
    })
}

/// Full cycle over every known channel with bounded concurrency. A channel's
/// failure becomes a recorded outcome and never aborts its siblings.
pub async fn parse_all_channels(ctx: Arc<ParseContext>) -> anyhow::Result<CycleSummary> {
    let channels = ctx.store.list_channels().await?;
    let channels_total = channels.len();

    let outcomes = fanout::for_each_bounded(channels, ctx.channel_concurrency, {
        let ctx = Arc::clone(&ctx);
        move |channel: ChannelRecord| {
            let ctx = Arc::clone(&ctx);
            async move {
                let name = channel
                    .username
                    .clone()
                    .unwrap_or_else(|| channel.title.clone());
                match parse_channel(&ctx, &channel.link()).await {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        warn!(channel = %name, %err, "channel parse failed");
                        ChannelOutcome::failed(name, err.kind(), err.to_string())
                    }
                }
            }
        }
    })
    .await;

    let summary = CycleSummary::from_outcomes(channels_total, outcomes);
    info!(
        channels_total = summary.channels_total,
        channels_failed = summary.channels_failed,
        posts_saved = summary.posts_saved,
        "parse cycle finished"
    );
    Ok(summary)
}

fn classify_post(ctx: &ParseContext, channel_id: i64, post: FetchedPost) -> NewPost {
    let topics = ctx.topics.predict(&post.message);
    let problem = ctx.problems.predict(&post.message);
    NewPost {
        channel_id,
        post_id: post.post_id,
        message: post.message,
        date: post.date,
        views: post.views,
        comments_count: post.comments_count,
        topics,
        problem_probability: Some(problem.probability),
        problem_confidence: Some(problem.confidence),
    }
}
