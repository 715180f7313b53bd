//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - OpenAI chat-completions over HTTP for the LlmProvider port
//! - An offline demo provider for demo mode and tests

pub mod demo;
pub mod openai;
