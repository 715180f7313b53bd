//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod llm_provider;

pub use llm_provider::{CompletionRequest, LlmProvider, PromptPurpose};
