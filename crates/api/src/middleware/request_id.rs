use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use nanoid::nanoid;
use tracing::Instrument;

use crate::state::RequestId;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags every request with an id and echoes it back in the response. An id
/// supplied by an upstream proxy is kept when it is well formed, so one
/// request can be traced across services.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let id = inbound_or_generated(req.headers());
    req.extensions_mut().insert(RequestId(id.clone()));

    let span = tracing::info_span!("request", request_id = %id);
    let mut resp = next.run(req).instrument(span).await;

    if let Ok(value) = id.parse() {
        resp.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    resp
}

fn inbound_or_generated(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| is_well_formed(value))
        .map(String::from)
        .unwrap_or_else(|| format!("req_{}", nanoid!(16)))
}

fn is_well_formed(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
