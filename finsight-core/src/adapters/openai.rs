//! OpenAI chat-completions client
//!
//! Sends one system and one user message to `{base_url}/chat/completions`
//! and returns the first choice's content. Failures are mapped to
//! `ProviderError` kinds; nothing is retried.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::result::{Error, ProviderError, ProviderErrorKind, Result};
use crate::ports::{CompletionRequest, LlmProvider};

const PROVIDER: &str = "openai";

/// Longest slice of an error body kept in the message
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat-completions provider
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
}

impl OpenAiProvider {
    /// Create a client for the given API root (e.g. `https://api.openai.com/v1`)
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| Error::config("API key contains characters not allowed in a header"))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: completions_endpoint(base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Map a non-success HTTP status to a provider error
fn status_error(status: u16, body: &str, model: &str) -> ProviderError {
    let body_lower = body.to_lowercase();

    let kind = match status {
        // 429 covers both rate limiting and an exhausted quota
        429 if body_lower.contains("quota") || body_lower.contains("billing") => {
            ProviderErrorKind::QuotaExceeded
        }
        429 => ProviderErrorKind::RateLimit,
        401 | 403 => ProviderErrorKind::InvalidApiKey,
        404 => ProviderErrorKind::ModelNotFound,
        500..=599 => ProviderErrorKind::ServerError,
        _ => ProviderErrorKind::Other,
    };

    let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    let message = if excerpt.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, excerpt)
    };

    ProviderError::new(kind, PROVIDER, model, message)
}

fn transport_error(err: &reqwest::Error, model: &str) -> ProviderError {
    if err.is_timeout() {
        ProviderError::network(PROVIDER, model, "Request timed out")
    } else if err.is_connect() {
        ProviderError::network(PROVIDER, model, "Connection failed")
    } else {
        ProviderError::network(PROVIDER, model, err.to_string())
    }
}

/// First choice's content, if it has any text
fn extract_content(body: &str, model: &str) -> std::result::Result<String, ProviderError> {
    let data: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::new(
            ProviderErrorKind::Other,
            PROVIDER,
            model,
            format!("Unexpected response body: {}", e),
        )
    })?;

    data.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ProviderError::empty_response(PROVIDER, model))
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let model = request.model.as_str();
        let body = ChatCompletionRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
        };

        let started = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&e, model))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(&e, model))?;

        debug!(
            model,
            purpose = request.purpose.as_str(),
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chat completion finished"
        );

        if !status.is_success() {
            let err = status_error(status.as_u16(), &text, model);
            warn!(model, kind = err.kind.as_str(), "chat completion failed");
            return Err(err.into());
        }

        Ok(extract_content(&text, model)?)
    }
}
