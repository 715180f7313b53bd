//! Derived summaries over a transaction batch
//!
//! Everything here is built fresh per request and thrown away with the
//! response.

use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::domain::lenient::serialize_amount;
use crate::domain::period::Period;

/// Grouping key for aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupBy {
    Category,
    Merchant,
    PaymentMethod,
}

impl GroupBy {
    /// Name of the key field when a summary is serialized
    pub fn field_name(&self) -> &'static str {
        match self {
            GroupBy::Category => "category",
            GroupBy::Merchant => "merchant",
            GroupBy::PaymentMethod => "method",
        }
    }
}

/// Total amount and entry count for one grouping key
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub group_by: GroupBy,
    pub key: String,
    pub amount: Decimal,
    pub count: usize,
}

impl GroupSummary {
    pub fn new(group_by: GroupBy, key: impl Into<String>) -> Self {
        Self {
            group_by,
            key: key.into(),
            amount: Decimal::ZERO,
            count: 0,
        }
    }

    /// "1 entry" / "3 entries"
    pub fn entries_label(&self) -> String {
        entries_label(self.count)
    }
}

impl Serialize for GroupSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(self.group_by.field_name(), &self.key)?;
        map.serialize_entry("amount", &Money(self.amount))?;
        map.serialize_entry("count", &self.count)?;
        map.end()
    }
}

/// Decimal that serializes through `serialize_amount`
struct Money(Decimal);

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_amount(&self.0, serializer)
    }
}

pub fn entries_label(count: usize) -> String {
    if count == 1 {
        "1 entry".to_string()
    } else {
        format!("{} entries", count)
    }
}

/// Income/expense totals for one period
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodTotals {
    #[serde(serialize_with = "serialize_amount")]
    pub expense: Decimal,
    pub expense_count: usize,
    #[serde(serialize_with = "serialize_amount")]
    pub income: Decimal,
    pub income_count: usize,
    /// income - expense
    #[serde(serialize_with = "serialize_amount")]
    pub net: Decimal,
    /// All transactions in the period, any type
    pub count: usize,
}

/// Month-over-month change for one expense category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryChange {
    pub category: String,
    #[serde(serialize_with = "serialize_amount")]
    pub current: Decimal,
    #[serde(serialize_with = "serialize_amount")]
    pub previous: Decimal,
    /// `None` when there was no spend in the previous period
    pub change_pct: Option<f64>,
}

/// A recurring bill or subscription seen in the period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringItem {
    pub name: String,
    pub category: String,
    #[serde(serialize_with = "serialize_amount")]
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// All summaries for one period
#[derive(Debug, Clone, Serialize)]
pub struct PeriodSnapshot {
    pub period: Period,
    pub totals: PeriodTotals,
    pub expense_categories: Vec<GroupSummary>,
    pub income_categories: Vec<GroupSummary>,
    pub merchants: Vec<GroupSummary>,
    pub payment_methods: Vec<GroupSummary>,
    pub recurring: Vec<RecurringItem>,
}

impl PeriodSnapshot {
    pub fn is_empty(&self) -> bool {
        self.totals.count == 0
    }
}

/// Budget position for the current period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    #[serde(serialize_with = "serialize_amount")]
    pub budget: Decimal,
    #[serde(serialize_with = "serialize_amount")]
    pub spent: Decimal,
    #[serde(serialize_with = "serialize_amount")]
    pub remaining: Decimal,
    pub days_left: i64,
    /// remaining / days_left, when there are days left
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_allowance: Option<f64>,
}

/// Everything computed locally and handed to the model
#[derive(Debug, Clone, Serialize)]
pub struct InsightDigest {
    pub current: PeriodSnapshot,
    pub previous: PeriodSnapshot,
    pub top_categories: Vec<GroupSummary>,
    pub category_changes: Vec<CategoryChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetStatus>,
    pub days_left: i64,
}
