//! Finsight Core - spending insights for a personal expense tracker
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (Transaction, Period, summaries, request/reply shapes)
//! - **ports**: Trait definitions for external dependencies (LlmProvider)
//! - **services**: Aggregation, prompt building, response parsing, orchestration
//! - **adapters**: Concrete implementations (OpenAI, offline demo)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::sync::Arc;

use adapters::demo::DemoProvider;
use adapters::openai::OpenAiProvider;
use config::Config;
use ports::LlmProvider;
use services::{InsightService, InsightSettings};

// Re-export commonly used types at crate root
pub use domain::result::{Error, ProviderError, ProviderErrorKind, Result};
pub use domain::{InsightRequest, Period, Transaction};

/// Main context for Finsight operations
///
/// Built once at startup and shared (behind an `Arc`) by every request.
pub struct FinsightContext {
    pub config: Config,
    pub provider: Arc<dyn LlmProvider>,
    pub insight_service: InsightService,
}

impl FinsightContext {
    /// Create a context, choosing the provider from the configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let provider: Arc<dyn LlmProvider> = if config.demo_mode {
            Arc::new(DemoProvider::new())
        } else {
            let api_key = config
                .llm
                .api_key
                .as_deref()
                .ok_or_else(|| Error::config("OPENAI_API_KEY is not set"))?;
            Arc::new(OpenAiProvider::new(
                api_key,
                &config.llm.base_url,
                config.request_timeout(),
            )?)
        };

        Self::with_provider(config, provider)
    }

    /// Create a context around an existing provider
    pub fn with_provider(config: Config, provider: Arc<dyn LlmProvider>) -> Result<Self> {
        let settings = InsightSettings::from_config(&config)?;
        let insight_service = InsightService::new(Arc::clone(&provider), settings);

        Ok(Self {
            config,
            provider,
            insight_service,
        })
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}
