use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiResult, AppError},
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/analytics/posts-by-date", get(posts_by_date))
        .route("/v1/analytics/posts-by-topic", get(posts_by_topic))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RangeQuery {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl RangeQuery {
    /// Defaults to the trailing 30 days ending today. An inverted range is a
    /// client error.
    fn resolve(&self, request_id: &RequestId) -> Result<(NaiveDate, NaiveDate), crate::error::ApiError> {
        let to = self.to.unwrap_or_else(|| Utc::now().date_naive());
        let from = self.from.unwrap_or(to - Duration::days(30));
        if from > to {
            return Err(
                AppError::BadRequest("from must not be after to".to_string())
                    .with_request_id(&request_id.0),
            );
        }
        Ok((from, to))
    }
}

#[derive(Debug, Serialize)]
struct PostsByDateResponse {
    dates: Vec<NaiveDate>,
    counts: Vec<i64>,
}

#[derive(Debug, Serialize)]
struct PostsByTopicResponse {
    topics: Vec<String>,
    counts: Vec<i64>,
}

async fn posts_by_date(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<PostsByDateResponse>> {
    let (from, to) = query.resolve(&request_id)?;

    let rows = telepulse_db::queries::posts::counts_by_date(&state.db, from, to)
        .await
        .map_err(|_| AppError::Internal.with_request_id(&request_id.0))?;

    let (dates, counts) = rows.into_iter().unzip();
    Ok(Json(PostsByDateResponse { dates, counts }))
}

async fn posts_by_topic(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<PostsByTopicResponse>> {
    let (from, to) = query.resolve(&request_id)?;

    let rows = telepulse_db::queries::posts::counts_by_topic(&state.db, from, to)
        .await
        .map_err(|_| AppError::Internal.with_request_id(&request_id.0))?;

    let (topics, counts) = rows.into_iter().unzip();
    Ok(Json(PostsByTopicResponse { topics, counts }))
}
