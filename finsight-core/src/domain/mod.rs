//! Core domain entities
//!
//! Pure data structures with parsing and validation logic - no I/O.

pub mod lenient;
pub mod period;
mod request;
pub mod result;
pub mod summary;
mod transaction;

pub use period::{extract_period, utc_offset, Period, DEFAULT_UTC_OFFSET_MINUTES};
pub use request::{ChatAnswer, ChatEntry, InsightGroup, InsightRequest};
pub use summary::{
    BudgetStatus, CategoryChange, GroupBy, GroupSummary, InsightDigest, PeriodSnapshot,
    PeriodTotals, RecurringItem,
};
pub use transaction::{annotate_periods, Transaction, TransactionKind, UNCATEGORIZED, UNKNOWN};
