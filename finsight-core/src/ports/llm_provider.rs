//! LLM provider port
//!
//! Defines the interface for sending a prompt to a hosted chat model. The
//! insight service depends only on this trait; concrete clients live in
//! `adapters`.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::result::Result;

/// What a completion is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptPurpose {
    /// Monthly insight groups
    Insight,
    /// Answer to a user question
    Chat,
}

impl PromptPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptPurpose::Insight => "insight",
            PromptPurpose::Chat => "chat",
        }
    }
}

/// One system message plus one user message
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub purpose: PromptPurpose,
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Chat-completion provider trait
///
/// Implementations send the request once and return the raw text of the
/// first choice. They do not retry.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "openai", "demo")
    fn name(&self) -> &str;

    /// Run one completion and return the model's text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
