use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use telepulse_core::ParseError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub request_id: String,
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    RateLimited(String),
    Internal,
}

#[derive(Debug)]
pub struct ApiError {
    pub error: AppError,
    pub request_id: String,
}

impl AppError {
    pub fn with_request_id(self, request_id: &str) -> ApiError {
        ApiError {
            error: self,
            request_id: request_id.to_string(),
        }
    }

    /// HTTP mapping of the parse taxonomy: 400 invalid link, 404 missing
    /// channel, 429 throttled, 500 for everything else.
    pub fn from_parse(err: ParseError) -> Self {
        match err {
            ParseError::InvalidLink(_) => AppError::BadRequest(err.to_string()),
            ParseError::ChannelNotFound(_) => AppError::NotFound(err.to_string()),
            ParseError::RateLimited { .. } => AppError::RateLimited(err.to_string()),
            ParseError::Other(_) => AppError::Internal,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self.error {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, "rate_limited", msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Unexpected error".to_string(),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody {
                    code: code.to_string(),
                    message,
                    request_id: self.request_id,
                },
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::IntoResponse;
    use std::time::Duration;

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn test_with_request_id() {
        let err = AppError::Internal.with_request_id("req_123");
        assert_eq!(err.request_id, "req_123");
    }

    #[test]
    fn test_bad_request_response() {
        rt().block_on(async {
            let err = AppError::BadRequest("missing link".to_string()).with_request_id("req_001");
            let response = err.into_response();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let body = to_bytes(response.into_body(), 1024).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

            assert_eq!(json["error"]["code"], "invalid_request");
            assert_eq!(json["error"]["message"], "missing link");
            assert_eq!(json["error"]["request_id"], "req_001");
        });
    }

    #[test]
    fn test_not_found_response() {
        rt().block_on(async {
            let err = AppError::NotFound("channel xyz".to_string()).with_request_id("req_002");
            let response = err.into_response();

            assert_eq!(response.status(), StatusCode::NOT_FOUND);

            let body = to_bytes(response.into_body(), 1024).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

            assert_eq!(json["error"]["code"], "not_found");
            assert_eq!(json["error"]["message"], "channel xyz");
        });
    }

    #[test]
    fn test_rate_limited_response() {
        rt().block_on(async {
            let err = AppError::RateLimited("slow down".to_string()).with_request_id("req_003");
            let response = err.into_response();

            assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

            let body = to_bytes(response.into_body(), 1024).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

            assert_eq!(json["error"]["code"], "rate_limited");
        });
    }

    #[test]
    fn test_internal_error_response() {
        rt().block_on(async {
            let err = AppError::Internal.with_request_id("req_004");
            let response = err.into_response();

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

            let body = to_bytes(response.into_body(), 1024).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

            assert_eq!(json["error"]["code"], "internal_error");
            assert_eq!(json["error"]["message"], "Unexpected error");
        });
    }

    #[test]
    fn test_parse_taxonomy_mapping() {
        assert!(matches!(
            AppError::from_parse(ParseError::InvalidLink("x".into())),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from_parse(ParseError::ChannelNotFound("x".into())),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from_parse(ParseError::RateLimited {
                retry_after: Duration::from_secs(5)
            }),
            AppError::RateLimited(_)
        ));
        assert!(matches!(
            AppError::from_parse(ParseError::Other(anyhow::anyhow!("boom"))),
            AppError::Internal
        ));
    }
}
