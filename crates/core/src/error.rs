use std::time::Duration;

use thiserror::Error;

/// Errors produced while resolving and parsing a channel. The orchestrator
/// converts these into per-channel outcome records; the API maps them onto
/// HTTP status codes.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed channel link. Not retryable.
    #[error("invalid channel link: {0}")]
    InvalidLink(String),

    /// Entity does not exist or is not a broadcast channel.
    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    /// External throttling. Retryable after the carried wait duration; the
    /// scheduler decides whether to retry, the core never does.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ParseError {
    /// Short machine-readable tag used in outcome records and job results.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::InvalidLink(_) => "invalid_link",
            ParseError::ChannelNotFound(_) => "channel_not_found",
            ParseError::RateLimited { .. } => "rate_limited",
            ParseError::Other(_) => "internal",
        }
    }
}
