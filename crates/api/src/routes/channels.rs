use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use telepulse_core::types::WorkerJob;
use telepulse_db::models::{Channel, Post};
use telepulse_telegram::fetcher::channel_info;

use crate::{
    error::{ApiResult, AppError},
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/channels", post(add_channel).get(list_channels))
        .route("/v1/channels/{tg_id}", get(get_channel))
        .route("/v1/channels/{tg_id}/posts", get(channel_posts))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AddChannelRequest {
    link: String,
}

#[derive(Debug, Serialize)]
struct AddChannelResponse {
    status: &'static str,
    channel: ChannelView,
    parse_job_id: String,
}

#[derive(Debug, Serialize)]
struct ChannelView {
    tg_id: i64,
    username: Option<String>,
    title: String,
    participants_count: Option<i32>,
    last_parsed_at: Option<DateTime<Utc>>,
}

impl From<Channel> for ChannelView {
    fn from(channel: Channel) -> Self {
        Self {
            tg_id: channel.tg_id,
            username: channel.username,
            title: channel.title,
            participants_count: channel.participants_count,
            last_parsed_at: channel.last_parsed_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChannelListResponse {
    items: Vec<ChannelView>,
}

#[derive(Debug, Deserialize)]
struct PostsQuery {
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct PostListResponse {
    items: Vec<PostView>,
}

#[derive(Debug, Serialize)]
struct PostView {
    post_id: i64,
    message: String,
    date: DateTime<Utc>,
    views: Option<i32>,
    comments_count: i32,
    topics: Vec<String>,
    problem_probability: Option<f64>,
    problem_confidence: Option<f64>,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            post_id: post.post_id,
            message: post.message,
            date: post.date,
            views: post.views,
            comments_count: post.comments_count,
            topics: post.topics,
            problem_probability: post.problem_probability,
            problem_confidence: post.problem_confidence,
        }
    }
}

/// Resolves the link against the gateway, registers the channel and queues an
/// initial parse of its history.
async fn add_channel(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(payload): Json<AddChannelRequest>,
) -> ApiResult<Json<AddChannelResponse>> {
    let info = channel_info(state.telegram.as_ref(), &payload.link)
        .await
        .map_err(|err| AppError::from_parse(err).with_request_id(&request_id.0))?;

    let channel = telepulse_db::queries::channels::upsert(&state.db, &info)
        .await
        .map_err(|_| AppError::Internal.with_request_id(&request_id.0))?;

    let parse_job_id = state
        .queue
        .enqueue(WorkerJob::AddChannel {
            link: payload.link.clone(),
        })
        .await
        .map_err(|_| AppError::Internal.with_request_id(&request_id.0))?;

    info!(tg_id = channel.tg_id, %parse_job_id, "channel registered");

    Ok(Json(AddChannelResponse {
        status: "queued",
        channel: channel.into(),
        parse_job_id,
    }))
}

async fn list_channels(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Json<ChannelListResponse>> {
    let channels = telepulse_db::queries::channels::list_all(&state.db)
        .await
        .map_err(|_| AppError::Internal.with_request_id(&request_id.0))?;

    Ok(Json(ChannelListResponse {
        items: channels.into_iter().map(ChannelView::from).collect(),
    }))
}

async fn get_channel(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(tg_id): Path<i64>,
) -> ApiResult<Json<ChannelView>> {
    let channel = telepulse_db::queries::channels::get_by_tg_id(&state.db, tg_id)
        .await
        .map_err(|_| AppError::Internal.with_request_id(&request_id.0))?
        .ok_or_else(|| {
            AppError::NotFound("channel not found".to_string()).with_request_id(&request_id.0)
        })?;

    Ok(Json(channel.into()))
}

async fn channel_posts(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(tg_id): Path<i64>,
    Query(query): Query<PostsQuery>,
) -> ApiResult<Json<PostListResponse>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);

    telepulse_db::queries::channels::get_by_tg_id(&state.db, tg_id)
        .await
        .map_err(|_| AppError::Internal.with_request_id(&request_id.0))?
        .ok_or_else(|| {
            AppError::NotFound("channel not found".to_string()).with_request_id(&request_id.0)
        })?;

    let posts = telepulse_db::queries::posts::list_recent(&state.db, tg_id, limit)
        .await
        .map_err(|_| AppError::Internal.with_request_id(&request_id.0))?;

    Ok(Json(PostListResponse {
        items: posts.into_iter().map(PostView::from).collect(),
    }))
}
