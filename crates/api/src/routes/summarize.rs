use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use telepulse_core::types::WorkerJob;
use telepulse_summarize::SummarizeError;

use crate::{
    error::{ApiError, ApiResult, AppError},
    state::{AppState, RequestId},
};

/// Upper bound on input accepted for summarization, in characters.
const MAX_TEXT_CHARS: usize = 10_000;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/summarize", post(summarize))
        .route("/v1/summarize/jobs", post(summarize_async))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SummarizeRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct SummarizeResponse {
    summary: String,
}

#[derive(Debug, Serialize)]
struct SummarizeQueuedResponse {
    status: &'static str,
    job_id: String,
}

/// Proxies the text straight to the completion service and waits for the
/// summary. Long inputs belong on the async variant.
async fn summarize(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(payload): Json<SummarizeRequest>,
) -> ApiResult<Json<SummarizeResponse>> {
    let text = validate_text(&payload.text, &request_id)?;

    let summary = state
        .summarizer
        .summarize(text)
        .await
        .map_err(|err| map_summarize(err).with_request_id(&request_id.0))?;

    Ok(Json(SummarizeResponse { summary }))
}

/// Queues the summarization on the worker; the result lands in the job
/// status, readable through `/v1/jobs/{id}`.
async fn summarize_async(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(payload): Json<SummarizeRequest>,
) -> ApiResult<Json<SummarizeQueuedResponse>> {
    let text = validate_text(&payload.text, &request_id)?;

    let job_id = state
        .queue
        .enqueue(WorkerJob::Summarize {
            text: text.to_string(),
        })
        .await
        .map_err(|_| AppError::Internal.with_request_id(&request_id.0))?;

    info!(%job_id, "queued summarization");

    Ok(Json(SummarizeQueuedResponse {
        status: "queued",
        job_id,
    }))
}

fn validate_text<'a>(text: &'a str, request_id: &RequestId) -> Result<&'a str, ApiError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(
            AppError::BadRequest("text must not be empty".to_string())
                .with_request_id(&request_id.0),
        );
    }
    if trimmed.chars().count() > MAX_TEXT_CHARS {
        return Err(AppError::BadRequest(format!(
            "text exceeds {MAX_TEXT_CHARS} characters"
        ))
        .with_request_id(&request_id.0));
    }
    Ok(trimmed)
}

fn map_summarize(err: SummarizeError) -> AppError {
    match err {
        SummarizeError::Api { status: 429, .. } => AppError::RateLimited(err.to_string()),
        _ => AppError::Internal,
    }
}
