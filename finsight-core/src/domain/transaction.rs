//! Transaction domain model
//!
//! Transactions arrive in a batch with every request; they are never
//! stored. Field names follow the mobile app export ("Amount", "Category",
//! "IsRecurring", ...) with lower/snake-case aliases accepted on input.

use chrono::FixedOffset;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

use crate::domain::lenient;
use crate::domain::period::{extract_period, Period};

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const UNKNOWN: &str = "Unknown";

/// Expense (0), income (1), or any other type code the client uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransactionKind {
    #[default]
    Expense,
    Income,
    Other(i64),
}

impl TransactionKind {
    pub fn code(&self) -> i64 {
        match self {
            TransactionKind::Expense => 0,
            TransactionKind::Income => 1,
            TransactionKind::Other(code) => *code,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            0 => TransactionKind::Expense,
            1 => TransactionKind::Income,
            other => TransactionKind::Other(other),
        }
    }

    fn from_value(value: &JsonValue) -> Self {
        match value {
            JsonValue::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(Self::from_code)
                .unwrap_or_default(),
            JsonValue::String(s) => match s.trim().to_lowercase().as_str() {
                "expense" | "debit" => TransactionKind::Expense,
                "income" | "credit" => TransactionKind::Income,
                other => other.parse().map(Self::from_code).unwrap_or_default(),
            },
            _ => TransactionKind::Expense,
        }
    }
}

impl Serialize for TransactionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for TransactionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// A single transaction as supplied by the client
///
/// Decoding goes through the raw JSON object so that a client sending two
/// spellings of one field (`Transaction` and `Merchant`, `Date` and `date`)
/// is not rejected. The first non-null spelling in each alias list wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Map<String, JsonValue>")]
pub struct Transaction {
    #[serde(rename = "Amount", serialize_with = "lenient::serialize_amount")]
    pub amount: Decimal,

    #[serde(rename = "Category", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Raw date value: ISO string, locale string, or epoch millis
    #[serde(rename = "Date", skip_serializing_if = "Option::is_none")]
    pub date: Option<JsonValue>,

    #[serde(rename = "IsRecurring")]
    pub is_recurring: bool,

    /// Payment method (Cash, UPI, Card, ...)
    #[serde(rename = "Method", skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Merchant or transaction name
    #[serde(rename = "Transaction", skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,

    #[serde(rename = "Note", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(rename = "Type")]
    pub kind: TransactionKind,

    #[serde(rename = "Period", skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,

    /// Any other fields the client sent, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

const AMOUNT_KEYS: &[&str] = &["Amount", "amount"];
const CATEGORY_KEYS: &[&str] = &["Category", "category"];
const DATE_KEYS: &[&str] = &["Date", "date"];
const RECURRING_KEYS: &[&str] = &["IsRecurring", "isRecurring", "is_recurring", "recurring"];
const METHOD_KEYS: &[&str] = &["Method", "method", "PaymentMethod", "payment_method"];
const MERCHANT_KEYS: &[&str] = &["Transaction", "transaction", "Merchant", "merchant", "Name", "name"];
const NOTE_KEYS: &[&str] = &["Note", "note"];
const TYPE_KEYS: &[&str] = &["Type", "type"];
const PERIOD_KEYS: &[&str] = &["Period", "period"];

/// Remove every spelling of a field, keeping the first non-null value
fn take_field(map: &mut Map<String, JsonValue>, keys: &[&str]) -> Option<JsonValue> {
    let mut found = None;
    for key in keys {
        if let Some(value) = map.remove(*key) {
            if found.is_none() && !value.is_null() {
                found = Some(value);
            }
        }
    }
    found
}

fn take_text(map: &mut Map<String, JsonValue>, keys: &[&str]) -> Option<String> {
    take_field(map, keys).and_then(lenient::text_from_value)
}

fn period_from_value(value: &JsonValue) -> Option<Period> {
    match value {
        JsonValue::String(s) => s.parse().ok(),
        JsonValue::Number(n) => n.as_u64().and_then(|v| v.to_string().parse().ok()),
        _ => None,
    }
}

impl From<Map<String, JsonValue>> for Transaction {
    fn from(mut map: Map<String, JsonValue>) -> Self {
        Self {
            amount: take_field(&mut map, AMOUNT_KEYS)
                .and_then(|v| lenient::decimal_from_value(&v))
                .unwrap_or(Decimal::ZERO),
            category: take_text(&mut map, CATEGORY_KEYS),
            date: take_field(&mut map, DATE_KEYS),
            is_recurring: take_field(&mut map, RECURRING_KEYS)
                .map(|v| lenient::flag_from_value(&v))
                .unwrap_or(false),
            method: take_text(&mut map, METHOD_KEYS),
            merchant: take_text(&mut map, MERCHANT_KEYS),
            note: take_text(&mut map, NOTE_KEYS),
            kind: take_field(&mut map, TYPE_KEYS)
                .map(|v| TransactionKind::from_value(&v))
                .unwrap_or_default(),
            period: take_field(&mut map, PERIOD_KEYS).and_then(|v| period_from_value(&v)),
            extra: map,
        }
    }
}

impl Transaction {
    /// Create an expense with the given amount and category
    pub fn expense(amount: Decimal, category: &str) -> Self {
        Self {
            amount,
            category: Some(category.to_string()),
            kind: TransactionKind::Expense,
            ..Default::default()
        }
    }

    /// Create an income entry with the given amount and category
    pub fn income(amount: Decimal, category: &str) -> Self {
        Self {
            amount,
            category: Some(category.to_string()),
            kind: TransactionKind::Income,
            ..Default::default()
        }
    }

    /// Builder-style period setter
    pub fn in_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// Recompute `period` from the date field
    ///
    /// A parseable date always wins. When the date is missing or cannot be
    /// parsed, a period supplied by the client is kept.
    pub fn annotate_period(&mut self, offset: &FixedOffset) {
        if let Some(from_date) = self.date.as_ref().and_then(|d| extract_period(d, offset)) {
            self.period = Some(from_date);
        }
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn category_key(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }

    pub fn merchant_key(&self) -> &str {
        self.merchant.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn method_key(&self) -> &str {
        self.method.as_deref().unwrap_or(UNKNOWN)
    }
}

/// Annotate a whole batch with periods
pub fn annotate_periods(transactions: &mut [Transaction], offset: &FixedOffset) {
    for tx in transactions.iter_mut() {
        tx.annotate_period(offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::period::{utc_offset, DEFAULT_UTC_OFFSET_MINUTES};
    use serde_json::json;

    fn ist() -> FixedOffset {
        utc_offset(DEFAULT_UTC_OFFSET_MINUTES).unwrap()
    }

    #[test]
    fn test_deserialize_app_export_shape() {
        let tx: Transaction = serde_json::from_value(json!({
            "Amount": 250.5,
            "Category": "Food",
            "Date": "2025-06-15T10:30:00+05:30",
            "IsRecurring": false,
            "Method": "UPI",
            "Transaction": "Swiggy",
            "Type": 0,
            "Reference": "abc-123"
        }))
        .unwrap();

        assert_eq!(tx.amount, Decimal::new(2505, 1));
        assert_eq!(tx.category.as_deref(), Some("Food"));
        assert_eq!(tx.method.as_deref(), Some("UPI"));
        assert_eq!(tx.merchant.as_deref(), Some("Swiggy"));
        assert!(tx.is_expense());
        assert_eq!(tx.extra.get("Reference"), Some(&json!("abc-123")));
    }

    #[test]
    fn test_deserialize_lowercase_and_string_values() {
        let tx: Transaction = serde_json::from_value(json!({
            "amount": "1,200",
            "category": "  Rent ",
            "type": "1",
            "recurring": "yes",
            "merchant": "Landlord",
            "period": 202506
        }))
        .unwrap();

        assert_eq!(tx.amount, Decimal::new(1200, 0));
        assert_eq!(tx.category.as_deref(), Some("Rent"));
        assert!(tx.is_income());
        assert!(tx.is_recurring);
        assert_eq!(tx.period.map(|p| p.to_string()), Some("202506".to_string()));
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let tx: Transaction = serde_json::from_value(json!({"Amount": null, "Category": ""})).unwrap();
        assert_eq!(tx.amount, Decimal::ZERO);
        assert_eq!(tx.category_key(), UNCATEGORIZED);
        assert_eq!(tx.merchant_key(), UNKNOWN);
        assert_eq!(tx.kind, TransactionKind::Expense);
    }

    #[test]
    fn test_other_type_codes_kept() {
        let tx: Transaction = serde_json::from_value(json!({"Amount": 10, "Type": 2})).unwrap();
        assert_eq!(tx.kind, TransactionKind::Other(2));
        assert!(!tx.is_expense() && !tx.is_income());
    }

    #[test]
    fn test_serialize_uses_export_names() {
        let tx: Transaction = serde_json::from_value(json!({
            "amount": 100,
            "category": "Food",
            "type": 0,
            "Remarks1": "lunch"
        }))
        .unwrap();
        let value = serde_json::to_value(&tx).unwrap();

        assert_eq!(value["Amount"], json!(100));
        assert_eq!(value["Category"], json!("Food"));
        assert_eq!(value["Type"], json!(0));
        assert_eq!(value["IsRecurring"], json!(false));
        assert_eq!(value["Remarks1"], json!("lunch"));
        assert!(value.get("amount").is_none());
    }

    #[test]
    fn test_merchant_and_transaction_both_present() {
        let tx: Transaction = serde_json::from_value(json!({
            "Amount": 10,
            "Transaction": "Lunch",
            "Merchant": "Swiggy"
        }))
        .unwrap();

        assert_eq!(tx.merchant.as_deref(), Some("Lunch"));
        assert!(tx.extra.get("Merchant").is_none());
    }

    #[test]
    fn test_date_spellings_both_present() {
        let tx: Transaction = serde_json::from_value(json!({
            "Amount": 10,
            "Date": "2025-06-15",
            "date": "2025-01-01",
            "amount": 99
        }))
        .unwrap();

        assert_eq!(tx.date, Some(json!("2025-06-15")));
        assert_eq!(tx.amount, Decimal::new(10, 0));
        assert!(tx.extra.is_empty());
    }

    #[test]
    fn test_null_spelling_falls_through_to_next() {
        let tx: Transaction =
            serde_json::from_value(json!({"Amount": null, "amount": "75", "Name": "Cab"})).unwrap();
        assert_eq!(tx.amount, Decimal::new(75, 0));
        assert_eq!(tx.merchant.as_deref(), Some("Cab"));
    }

    #[test]
    fn test_request_with_duplicate_spellings_decodes() {
        let request: crate::domain::InsightRequest = serde_json::from_value(json!({
            "period": "202506",
            "transactions": [{"Amount": 10, "Transaction": "Lunch", "Merchant": "Swiggy"}]
        }))
        .unwrap();
        assert_eq!(request.transactions.len(), 1);
    }

    #[test]
    fn test_annotate_period_prefers_date() {
        let mut tx: Transaction = serde_json::from_value(json!({
            "Amount": 10,
            "Date": 1717200000000i64,
            "Period": "202501"
        }))
        .unwrap();
        tx.annotate_period(&ist());
        assert_eq!(tx.period.unwrap().to_string(), "202406");
    }

    #[test]
    fn test_annotate_period_keeps_supplied_period_without_date() {
        let mut tx: Transaction =
            serde_json::from_value(json!({"Amount": 10, "Period": "202506", "Date": "garbage"}))
                .unwrap();
        tx.annotate_period(&ist());
        assert_eq!(tx.period.unwrap().to_string(), "202506");
    }
}
