use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::Serialize;
use tracing::info;

use telepulse_core::types::WorkerJob;

use crate::{
    error::{ApiResult, AppError},
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/parse", post(trigger_parse))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ParseQueuedResponse {
    status: &'static str,
    job_id: String,
}

/// Queues a full parse cycle over every known channel. The response carries
/// the job id; progress is observable through `/v1/jobs/{id}`.
async fn trigger_parse(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Json<ParseQueuedResponse>> {
    let job_id = state
        .queue
        .enqueue(WorkerJob::FullCycle)
        .await
        .map_err(|_| AppError::Internal.with_request_id(&request_id.0))?;

    info!(%job_id, "queued full parse cycle");

    Ok(Json(ParseQueuedResponse {
        status: "queued",
        job_id,
    }))
}
