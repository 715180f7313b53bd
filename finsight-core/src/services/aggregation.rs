//! Aggregation - grouping a transaction batch into per-period summaries
//!
//! All groupings are single pass and keep keys in first-seen order. Any
//! ordering beyond that (top-N) is an explicit sort on top.
//!
//! Amounts come straight from the client, so sums saturate at the
//! `Decimal` bounds instead of overflowing.

use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::{
    BudgetStatus, CategoryChange, GroupBy, GroupSummary, InsightDigest, Period, PeriodSnapshot,
    PeriodTotals, RecurringItem, Transaction, TransactionKind,
};

/// Number of categories in "High Spend"
pub const TOP_CATEGORY_COUNT: usize = 3;

/// Number of month-over-month changes reported
pub const TOP_CHANGE_COUNT: usize = 3;

/// Which transactions of a period take part in a grouping
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    /// Case-insensitive category match
    pub category: Option<String>,
}

impl TransactionFilter {
    /// Every transaction in the period
    pub fn any() -> Self {
        Self::default()
    }

    pub fn expenses() -> Self {
        Self {
            kind: Some(TransactionKind::Expense),
            category: None,
        }
    }

    pub fn income() -> Self {
        Self {
            kind: Some(TransactionKind::Income),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(kind) = self.kind {
            if tx.kind != kind {
                return false;
            }
        }
        match &self.category {
            Some(category) => tx.category_key().eq_ignore_ascii_case(category.trim()),
            None => true,
        }
    }
}

/// Transactions of one period that pass the filter
pub fn matching<'a>(
    transactions: &'a [Transaction],
    period: &'a Period,
    filter: &'a TransactionFilter,
) -> impl Iterator<Item = &'a Transaction> + 'a {
    transactions
        .iter()
        .filter(move |tx| tx.period.as_ref() == Some(period) && filter.matches(tx))
}

/// Group transactions of a period by the given key
///
/// Returns one summary per distinct key, in the order keys were first seen.
pub fn group(
    transactions: &[Transaction],
    period: &Period,
    filter: &TransactionFilter,
    group_by: GroupBy,
) -> Vec<GroupSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<GroupSummary> = Vec::new();

    for tx in matching(transactions, period, filter) {
        let key = match group_by {
            GroupBy::Category => tx.category_key(),
            GroupBy::Merchant => tx.merchant_key(),
            GroupBy::PaymentMethod => tx.method_key(),
        };

        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(GroupSummary::new(group_by, key));
            groups.len() - 1
        });

        let summary = &mut groups[slot];
        summary.amount = summary.amount.saturating_add(tx.amount);
        summary.count += 1;
    }

    groups
}

pub fn by_category(
    transactions: &[Transaction],
    period: &Period,
    filter: &TransactionFilter,
) -> Vec<GroupSummary> {
    group(transactions, period, filter, GroupBy::Category)
}

pub fn by_merchant(
    transactions: &[Transaction],
    period: &Period,
    filter: &TransactionFilter,
) -> Vec<GroupSummary> {
    group(transactions, period, filter, GroupBy::Merchant)
}

pub fn by_payment_method(
    transactions: &[Transaction],
    period: &Period,
    filter: &TransactionFilter,
) -> Vec<GroupSummary> {
    group(transactions, period, filter, GroupBy::PaymentMethod)
}

/// The `n` largest summaries by amount; ties keep first-seen order
pub fn top_by_amount(summaries: &[GroupSummary], n: usize) -> Vec<GroupSummary> {
    let mut sorted = summaries.to_vec();
    sorted.sort_by(|a, b| b.amount.cmp(&a.amount));
    sorted.truncate(n);
    sorted
}

/// Income and expense totals for one period
pub fn totals(transactions: &[Transaction], period: &Period) -> PeriodTotals {
    let mut totals = PeriodTotals::default();

    for tx in matching(transactions, period, &TransactionFilter::any()) {
        totals.count += 1;
        match tx.kind {
            TransactionKind::Expense => {
                totals.expense = totals.expense.saturating_add(tx.amount);
                totals.expense_count += 1;
            }
            TransactionKind::Income => {
                totals.income = totals.income.saturating_add(tx.amount);
                totals.income_count += 1;
            }
            TransactionKind::Other(_) => {}
        }
    }

    totals.net = totals.income.saturating_sub(totals.expense);
    totals
}

/// Recurring transactions of one period
pub fn recurring(transactions: &[Transaction], period: &Period) -> Vec<RecurringItem> {
    matching(transactions, period, &TransactionFilter::any())
        .filter(|tx| tx.is_recurring)
        .map(|tx| RecurringItem {
            name: tx
                .merchant
                .clone()
                .or_else(|| tx.note.clone())
                .unwrap_or_else(|| tx.category_key().to_string()),
            category: tx.category_key().to_string(),
            amount: tx.amount,
            method: tx.method.clone(),
        })
        .collect()
}

/// Percentage change from `previous` to `current`, one decimal place
///
/// `None` when there is no previous amount or the change is out of range.
pub fn percent_change(current: Decimal, previous: Decimal) -> Option<f64> {
    if previous.is_zero() {
        return None;
    }
    current
        .checked_sub(previous)?
        .checked_div(previous)?
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp(1)
        .to_f64()
}

/// Month-over-month change per category
///
/// Categories present in either period are reported, current-period
/// categories first. Keys match exactly, the same way `group` builds them.
pub fn category_changes(current: &[GroupSummary], previous: &[GroupSummary]) -> Vec<CategoryChange> {
    let find_previous = |key: &str| {
        previous
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.amount)
            .unwrap_or(Decimal::ZERO)
    };

    let mut changes: Vec<CategoryChange> = current
        .iter()
        .map(|c| {
            let prev_amount = find_previous(&c.key);
            CategoryChange {
                category: c.key.clone(),
                current: c.amount,
                previous: prev_amount,
                change_pct: percent_change(c.amount, prev_amount),
            }
        })
        .collect();

    for p in previous {
        if !current.iter().any(|c| c.key == p.key) {
            changes.push(CategoryChange {
                category: p.key.clone(),
                current: Decimal::ZERO,
                previous: p.amount,
                change_pct: percent_change(Decimal::ZERO, p.amount),
            });
        }
    }

    changes
}

/// The `n` changes with the largest absolute percentage
pub fn biggest_changes(changes: &[CategoryChange], n: usize) -> Vec<CategoryChange> {
    let mut comparable: Vec<CategoryChange> = changes
        .iter()
        .filter(|c| c.change_pct.is_some())
        .cloned()
        .collect();
    comparable.sort_by(|a, b| {
        let a = a.change_pct.unwrap_or(0.0).abs();
        let b = b.change_pct.unwrap_or(0.0).abs();
        b.total_cmp(&a)
    });
    comparable.truncate(n);
    comparable
}

/// Restrict a batch to the given periods
pub fn in_periods<'a>(transactions: &'a [Transaction], periods: &[Period]) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|tx| tx.period.map(|p| periods.contains(&p)).unwrap_or(false))
        .collect()
}

/// Build all summaries for one period
///
/// `merchant_category` restricts the merchant summary to one category.
pub fn build_snapshot(
    transactions: &[Transaction],
    period: &Period,
    merchant_category: Option<&str>,
) -> PeriodSnapshot {
    let merchant_filter = match merchant_category {
        Some(category) => TransactionFilter::expenses().with_category(category),
        None => TransactionFilter::expenses(),
    };

    PeriodSnapshot {
        period: *period,
        totals: totals(transactions, period),
        expense_categories: by_category(transactions, period, &TransactionFilter::expenses()),
        income_categories: by_category(transactions, period, &TransactionFilter::income()),
        merchants: by_merchant(transactions, period, &merchant_filter),
        payment_methods: by_payment_method(transactions, period, &TransactionFilter::expenses()),
        recurring: recurring(transactions, period),
    }
}

/// Budget position; `None` when no budget was given
pub fn budget_status(budget: Decimal, spent: Decimal, days_left: i64) -> Option<BudgetStatus> {
    if budget <= Decimal::ZERO {
        return None;
    }

    let remaining = budget.saturating_sub(spent);
    let daily_allowance = if days_left > 0 {
        (remaining / Decimal::from(days_left)).round_dp(2).to_f64()
    } else {
        None
    };

    Some(BudgetStatus {
        budget,
        spent,
        remaining,
        days_left,
        daily_allowance,
    })
}

/// Build the digest for the requested period and the one before it
pub fn build_digest(
    transactions: &[Transaction],
    period: &Period,
    budget: Decimal,
    days_left: i64,
    merchant_category: Option<&str>,
) -> InsightDigest {
    let current = build_snapshot(transactions, period, merchant_category);
    let previous = build_snapshot(transactions, &period.prev(), merchant_category);

    let top_categories = top_by_amount(&current.expense_categories, TOP_CATEGORY_COUNT);
    let changes = category_changes(&current.expense_categories, &previous.expense_categories);
    let category_changes = biggest_changes(&changes, TOP_CHANGE_COUNT);
    let budget = budget_status(budget, current.totals.expense, days_left);

    InsightDigest {
        current,
        previous,
        top_categories,
        category_changes,
        budget,
        days_left,
    }
}
