//! Insight service - one request in, one normalized reply out
//!
//! Validates the period, annotates transactions, builds the digest and then
//! either answers locally or asks the LLM. Holds no per-request state.

use std::sync::Arc;
use std::time::Instant;

use chrono::FixedOffset;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::domain::{annotate_periods, ChatAnswer, InsightDigest, InsightGroup, InsightRequest, Period};
use crate::ports::{CompletionRequest, LlmProvider, PromptPurpose};
use crate::services::aggregation::build_digest;
use crate::services::prompt::{build_chat_prompt, build_insight_prompt, Prompt};
use crate::services::quick_answer::quick_answer;
use crate::services::response::{normalize_payload, parse_payload};

/// Values the service needs from the configuration
#[derive(Debug, Clone)]
pub struct InsightSettings {
    pub model: String,
    pub temperature: f32,
    pub offset: FixedOffset,
    pub max_prompt_transactions: usize,
}

impl InsightSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            offset: config.utc_offset()?,
            max_prompt_transactions: config.insights.max_prompt_transactions,
        })
    }
}

#[derive(Serialize)]
struct InsightReply {
    insight_groups: Vec<InsightGroup>,
}

#[derive(Serialize)]
struct ChatReply {
    chat: ChatAnswer,
    insight_groups: Vec<InsightGroup>,
}

/// Insight service for `/ai-insight` requests
pub struct InsightService {
    provider: Arc<dyn LlmProvider>,
    settings: InsightSettings,
}

impl InsightService {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: InsightSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn settings(&self) -> &InsightSettings {
        &self.settings
    }

    /// Validate the request and compute its digest
    ///
    /// Transactions are annotated with their period in place.
    pub fn prepare(&self, request: &mut InsightRequest) -> Result<(Period, InsightDigest)> {
        let period = request.parse_period()?;
        annotate_periods(&mut request.transactions, &self.settings.offset);

        let digest = build_digest(
            &request.transactions,
            &period,
            request.budget,
            request.days_left,
            request.merchant_category.as_deref(),
        );

        Ok((period, digest))
    }

    /// Handle one insight or chat request
    pub async fn handle(&self, mut request: InsightRequest) -> Result<JsonValue> {
        let started = Instant::now();
        let (period, digest) = self.prepare(&mut request)?;
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.settings.model.clone());

        info!(
            period = %period,
            transactions = request.transactions.len(),
            in_period = digest.current.totals.count,
            chat = request.chat_query().is_some(),
            "handling insight request"
        );

        let reply = match request.chat_query() {
            None => {
                if digest.current.is_empty() {
                    info!(period = %period, "no transactions in period, skipping model call");
                    return Ok(serde_json::to_value(InsightReply {
                        insight_groups: vec![InsightGroup::no_data(&period)],
                    })?);
                }

                let prompt = build_insight_prompt(
                    &digest,
                    &request.transactions,
                    self.settings.max_prompt_transactions,
                )?;
                self.ask_model(PromptPurpose::Insight, &model, prompt).await?
            }
            Some(query) => {
                if let Some(answer) = quick_answer(query, &digest) {
                    debug!(header = %answer.header, "answered chat query locally");
                    return Ok(serde_json::to_value(ChatReply {
                        chat: answer,
                        insight_groups: Vec::new(),
                    })?);
                }

                let prompt = build_chat_prompt(
                    &digest,
                    &request.transactions,
                    self.settings.max_prompt_transactions,
                    query,
                )?;
                self.ask_model(PromptPurpose::Chat, &model, prompt).await?
            }
        };

        info!(
            period = %period,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "insight request complete"
        );
        Ok(reply)
    }

    async fn ask_model(&self, purpose: PromptPurpose, model: &str, prompt: Prompt) -> Result<JsonValue> {
        let request = CompletionRequest {
            purpose,
            model: model.to_string(),
            system: prompt.system,
            user: prompt.user,
            temperature: self.settings.temperature,
        };

        debug!(
            provider = self.provider.name(),
            model,
            purpose = purpose.as_str(),
            prompt_chars = request.user.len(),
            "calling model"
        );

        let raw = self.provider.complete(&request).await.map_err(|err| {
            warn!(provider = self.provider.name(), model, error = %err, "model call failed");
            err
        })?;

        let payload = parse_payload(&raw).map_err(|err| {
            if let Error::MalformedResponse { message, .. } = &err {
                warn!(provider = self.provider.name(), model, %message, "model returned malformed JSON");
            }
            err
        })?;

        Ok(normalize_payload(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::demo::DemoProvider;
    use crate::domain::period::{utc_offset, DEFAULT_UTC_OFFSET_MINUTES};
    use serde_json::json;

    fn settings() -> InsightSettings {
        InsightSettings {
            model: "gpt-4o".to_string(),
            temperature: 0.65,
            offset: utc_offset(DEFAULT_UTC_OFFSET_MINUTES).unwrap(),
            max_prompt_transactions: 300,
        }
    }

    fn service(provider: Arc<DemoProvider>) -> InsightService {
        InsightService::new(provider, settings())
    }

    fn request(value: JsonValue) -> InsightRequest {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_missing_period_is_rejected_before_model_call() {
        let provider = Arc::new(DemoProvider::new());
        let err = service(provider.clone())
            .handle(request(json!({"transactions": []})))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_period_returns_no_data_group() {
        let provider = Arc::new(DemoProvider::new());
        let reply = service(provider.clone())
            .handle(request(json!({
                "period": "202506",
                "transactions": [{"Amount": 10, "Category": "Food", "Date": "2025-05-10"}]
            })))
            .await
            .unwrap();

        assert_eq!(reply["insight_groups"][0]["header"], "No Data");
        assert_eq!(reply["insight_groups"][0]["type"], "Summary");
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_model_override_and_temperature() {
        let provider = Arc::new(DemoProvider::new());
        service(provider.clone())
            .handle(request(json!({
                "period": "202506",
                "model": "gpt-4o-mini",
                "transactions": [{"Amount": 10, "Category": "Food", "Date": "2025-06-10"}]
            })))
            .await
            .unwrap();

        let sent = provider.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].model, "gpt-4o-mini");
        assert_eq!(sent[0].purpose, PromptPurpose::Insight);
        assert_eq!(sent[0].temperature, 0.65);
    }

    #[tokio::test]
    async fn test_quick_answer_skips_model() {
        let provider = Arc::new(DemoProvider::new());
        let reply = service(provider.clone())
            .handle(request(json!({
                "period": "202506",
                "query": "How much did I spend on food?",
                "transactions": [
                    {"Amount": 100, "Category": "Food", "Date": "2025-06-10"},
                    {"Amount": 50, "Category": "Food", "Date": "2025-06-11"}
                ]
            })))
            .await
            .unwrap();

        assert_eq!(reply["chat"]["header"], "Spending on Food");
        assert_eq!(reply["insight_groups"], json!([]));
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_model_output_keeps_raw_text() {
        let provider = Arc::new(DemoProvider::replying("Sorry, I can't help with that."));
        let err = service(provider)
            .handle(request(json!({
                "period": "202506",
                "query": "Any tips?",
                "transactions": []
            })))
            .await
            .unwrap_err();

        match err {
            Error::MalformedResponse { raw, .. } => assert_eq!(raw, "Sorry, I can't help with that."),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
