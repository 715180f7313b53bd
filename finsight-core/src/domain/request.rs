//! Insight request and reply shapes

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::lenient;
use crate::domain::period::Period;
use crate::domain::result::{Error, Result};
use crate::domain::transaction::Transaction;

/// Body of `POST /ai-insight`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightRequest {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// Reporting period, "YYYYMM"
    #[serde(default, deserialize_with = "lenient::text")]
    pub period: Option<String>,
    /// Chat question; absent or blank means insight mode
    #[serde(default, deserialize_with = "lenient::text")]
    pub query: Option<String>,
    /// Monthly budget; 0 means no budget
    #[serde(
        default,
        deserialize_with = "lenient::decimal",
        serialize_with = "lenient::serialize_amount"
    )]
    pub budget: Decimal,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub days_left: i64,
    /// Restrict merchant insights to one category
    #[serde(default, deserialize_with = "lenient::text")]
    pub merchant_category: Option<String>,
    /// Per-request model override
    #[serde(default, deserialize_with = "lenient::text")]
    pub model: Option<String>,
}

impl InsightRequest {
    /// Validate and parse the requested period
    pub fn parse_period(&self) -> Result<Period> {
        match self.period.as_deref() {
            None => Err(Error::validation("period is required")),
            Some(raw) => raw.parse(),
        }
    }

    /// The chat question, if this is a chat request
    pub fn chat_query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn has_budget(&self) -> bool {
        self.budget > Decimal::ZERO
    }
}

/// One labeled observation destined for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightGroup {
    pub header: String,
    pub detail: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub transactions: Vec<JsonValue>,
}

impl InsightGroup {
    /// Group returned when the period has no transactions at all
    pub fn no_data(period: &Period) -> Self {
        Self {
            header: "No Data".to_string(),
            detail: format!(
                "No transactions found for {}. Add some expenses or income to see insights.",
                period.label()
            ),
            kind: "Summary".to_string(),
            category: String::new(),
            transactions: Vec::new(),
        }
    }
}

/// A single chat answer line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub header: String,
    pub detail: String,
}

impl ChatEntry {
    pub fn new(header: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            detail: detail.into(),
        }
    }
}

/// A chat reply: a headline plus entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub header: String,
    pub entries: Vec<ChatEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let req: InsightRequest = serde_json::from_value(json!({"period": "202506"})).unwrap();
        assert!(req.transactions.is_empty());
        assert_eq!(req.budget, Decimal::ZERO);
        assert_eq!(req.days_left, 0);
        assert!(req.chat_query().is_none());
        assert_eq!(req.parse_period().unwrap().to_string(), "202506");
    }

    #[test]
    fn test_blank_query_is_insight_mode() {
        let req: InsightRequest =
            serde_json::from_value(json!({"period": "202506", "query": "   "})).unwrap();
        assert!(req.chat_query().is_none());
    }

    #[test]
    fn test_missing_or_bad_period_is_validation_error() {
        let req: InsightRequest = serde_json::from_value(json!({"transactions": []})).unwrap();
        assert!(matches!(req.parse_period(), Err(Error::Validation(_))));

        let req: InsightRequest = serde_json::from_value(json!({"period": ""})).unwrap();
        assert!(matches!(req.parse_period(), Err(Error::Validation(_))));

        let req: InsightRequest = serde_json::from_value(json!({"period": "June"})).unwrap();
        assert!(matches!(req.parse_period(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_numeric_fields_accept_strings() {
        let req: InsightRequest = serde_json::from_value(json!({
            "period": 202506,
            "budget": "10000",
            "days_left": "12"
        }))
        .unwrap();
        assert_eq!(req.budget, Decimal::new(10000, 0));
        assert_eq!(req.days_left, 12);
        assert!(req.has_budget());
        assert_eq!(req.period.as_deref(), Some("202506"));
    }
}
