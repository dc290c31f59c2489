pub mod analytics;
pub mod channels;
pub mod health;
pub mod jobs;
pub mod parse;
pub mod summarize;

use axum::Router;

use crate::state::AppState;

pub fn v1_router(state: AppState) -> Router {
    Router::new()
        .merge(parse::router(state.clone()))
        .merge(channels::router(state.clone()))
        .merge(jobs::router(state.clone()))
        .merge(summarize::router(state.clone()))
        .merge(analytics::router(state))
}

pub fn health_router(state: AppState) -> Router {
    health::router(state)
}
