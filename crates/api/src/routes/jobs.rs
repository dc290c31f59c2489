use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use telepulse_core::types::JobState;

use crate::{
    error::{ApiResult, AppError},
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/jobs/{id}", get(get_job))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct JobResponse {
    job_id: String,
    state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    updated_at: DateTime<Utc>,
}

/// Looks up the status key written by the worker. Status keys expire after a
/// day, so finished jobs eventually read as unknown.
async fn get_job(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobResponse>> {
    let status = state
        .queue
        .status(&id)
        .await
        .map_err(|_| AppError::Internal.with_request_id(&request_id.0))?
        .ok_or_else(|| {
            AppError::NotFound("job not found".to_string()).with_request_id(&request_id.0)
        })?;

    Ok(Json(JobResponse {
        job_id: id,
        state: status.state,
        result: status.result,
        error: status.error,
        updated_at: status.updated_at,
    }))
}
