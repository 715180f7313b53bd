//! Result and error types for the core library

use serde::Serialize;
use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Provider(ProviderError),

    /// The model answered, but not with parseable JSON.
    #[error("Malformed model response: {message}")]
    MalformedResponse { message: String, raw: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a malformed response error, keeping the raw model text
    pub fn malformed(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
            raw: raw.into(),
        }
    }
}

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Kinds of LLM provider failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Too many requests
    RateLimit,
    /// Credits or quota exhausted
    QuotaExceeded,
    /// Missing, invalid or revoked API key
    InvalidApiKey,
    /// Model not found or not available to this key
    ModelNotFound,
    /// 5xx on the provider side
    ServerError,
    /// Connection failure or timeout
    Network,
    /// The provider answered without any content
    EmptyResponse,
    Other,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::RateLimit => "rate_limit",
            ProviderErrorKind::QuotaExceeded => "quota_exceeded",
            ProviderErrorKind::InvalidApiKey => "invalid_api_key",
            ProviderErrorKind::ModelNotFound => "model_not_found",
            ProviderErrorKind::ServerError => "server_error",
            ProviderErrorKind::Network => "network",
            ProviderErrorKind::EmptyResponse => "empty_response",
            ProviderErrorKind::Other => "other",
        }
    }
}

/// Structured LLM provider error
#[derive(Debug, Clone, Serialize, Error)]
#[error("{provider} ({model}): {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub provider: String,
    pub model: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(
        kind: ProviderErrorKind,
        provider: &str,
        model: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            provider: provider.to_string(),
            model: model.to_string(),
            message: message.into(),
        }
    }

    pub fn network(provider: &str, model: &str, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Network, provider, model, message)
    }

    pub fn empty_response(provider: &str, model: &str) -> Self {
        Self::new(
            ProviderErrorKind::EmptyResponse,
            provider,
            model,
            "Model returned no content",
        )
    }
}
