//! Client for the external summarization service, an OpenAI-compatible
//! chat-completions endpoint. The model itself is out of scope here; this
//! crate only shapes the request and unwraps the first completion.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const SYSTEM_PROMPT: &str = "Summarize the following Telegram channel posts \
     in a few short sentences. Keep concrete facts, drop filler and emoji.";

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("network error: {0}")]
    Network(String),

    #[error("summarizer error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("summarizer returned no completion")]
    EmptyCompletion,
}

impl From<reqwest::Error> for SummarizeError {
    fn from(err: reqwest::Error) -> Self {
        SummarizeError::Network(err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

pub struct SummarizeClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    model: String,
}

impl SummarizeClient {
    pub fn new(base_url: &str, token: Option<&str>, model: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("reqwest client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            model: model.to_string(),
        }
    }

    pub async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        let body = CompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: text,
                },
            ],
            max_tokens: 500,
            temperature: 0.3,
        };

        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SummarizeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = resp.json().await?;
        let summary = extract_summary(completion)?;
        debug!(chars = summary.len(), "summarization completed");
        Ok(summary)
    }
}

fn extract_summary(completion: CompletionResponse) -> Result<String, SummarizeError> {
    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .filter(|summary| !summary.is_empty())
        .ok_or(SummarizeError::EmptyCompletion)
}
