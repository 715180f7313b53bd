//! Offline demo provider
//!
//! Answers every completion with canned, fenced JSON shaped like a real
//! model reply, so the server and CLI can run without an API key. Tests
//! can script the reply text or a failure and inspect what was sent.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::result::{ProviderError, Result};
use crate::ports::{CompletionRequest, LlmProvider, PromptPurpose};

const PROVIDER: &str = "demo";

enum Script {
    Canned,
    Reply(String),
    Fail(ProviderError),
}

/// `LlmProvider` that never leaves the process
pub struct DemoProvider {
    script: Script,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl Default for DemoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoProvider {
    /// Canned replies chosen by request purpose
    pub fn new() -> Self {
        Self::with_script(Script::Canned)
    }

    /// Always reply with exactly this text
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_script(Script::Reply(text.into()))
    }

    /// Always fail with this error
    pub fn failing(err: ProviderError) -> Self {
        Self::with_script(Script::Fail(err))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

fn canned_reply(purpose: PromptPurpose) -> String {
    let payload = match purpose {
        PromptPurpose::Insight => json!({
            "insight_groups": [
                {
                    "header": "Monthly Summary",
                    "detail": "Demo mode is on. Connect an OpenAI API key to get insights written from your own transactions.",
                    "type": "Summary",
                    "category": "",
                    "transactions": []
                },
                {
                    "header": "Smart Suggestion",
                    "detail": "₹3,200 at Food Delivery (12 entries). Try limiting online orders to weekends for savings.",
                    "type": "Smart Suggestion",
                    "category": "Food Delivery",
                    "transactions": []
                }
            ]
        }),
        PromptPurpose::Chat => json!({
            "chat": {
                "header": "Demo answer",
                "entries": [
                    {
                        "header": "Demo mode",
                        "detail": "This answer is canned. Connect an OpenAI API key to ask questions about your own data."
                    }
                ]
            },
            "insight_groups": []
        }),
    };

    format!("```json\n{:#}\n```", payload)
}

#[async_trait]
impl LlmProvider for DemoProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match &self.script {
            Script::Canned => Ok(canned_reply(request.purpose)),
            Script::Reply(text) => Ok(text.clone()),
            Script::Fail(err) => Err(err.clone().into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::{Error, ProviderErrorKind};
    use crate::services::response::parse_payload;

    fn request(purpose: PromptPurpose) -> CompletionRequest {
        CompletionRequest {
            purpose,
            model: "gpt-4o".to_string(),
            system: "system".to_string(),
            user: "user".to_string(),
            temperature: 0.65,
        }
    }

    #[tokio::test]
    async fn test_canned_replies_parse() {
        let provider = DemoProvider::new();

        let insight = provider.complete(&request(PromptPurpose::Insight)).await.unwrap();
        assert!(insight.starts_with("```json"));
        let payload = parse_payload(&insight).unwrap();
        assert_eq!(payload["insight_groups"][0]["type"], "Summary");

        let chat = provider.complete(&request(PromptPurpose::Chat)).await.unwrap();
        let payload = parse_payload(&chat).unwrap();
        assert_eq!(payload["chat"]["header"], "Demo answer");

        assert_eq!(provider.request_count(), 2);
        assert_eq!(provider.requests()[1].purpose, PromptPurpose::Chat);
    }

    #[tokio::test]
    async fn test_scripted_reply_and_failure() {
        let provider = DemoProvider::replying("not json");
        assert_eq!(
            provider.complete(&request(PromptPurpose::Chat)).await.unwrap(),
            "not json"
        );

        let provider = DemoProvider::failing(ProviderError::new(
            ProviderErrorKind::RateLimit,
            "openai",
            "gpt-4o",
            "slow down",
        ));
        let err = provider.complete(&request(PromptPurpose::Insight)).await.unwrap_err();
        assert!(matches!(err, Error::Provider(ref e) if e.kind == ProviderErrorKind::RateLimit));
        assert_eq!(provider.request_count(), 1);
    }
}
