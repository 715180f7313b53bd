//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. The pure helpers
//! (aggregation, prompt building, response parsing) are public so the CLI
//! can reuse them directly.

pub mod aggregation;
mod insight;
pub mod prompt;
pub mod quick_answer;
pub mod response;

pub use aggregation::TransactionFilter;
pub use insight::{InsightService, InsightSettings};
