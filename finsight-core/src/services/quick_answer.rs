//! Quick answers - chat questions answered from the digest without a model call
//!
//! Rules are tried in order and the first one that matches wins. A question
//! none of them recognise, or one naming a category or merchant that is not
//! in the digest, goes to the LLM.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::domain::summary::entries_label;
use crate::domain::{BudgetStatus, ChatAnswer, ChatEntry, GroupSummary, InsightDigest, Period, PeriodSnapshot};
use crate::services::aggregation::{percent_change, top_by_amount, TOP_CATEGORY_COUNT};

static SPEND_ON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:spen[dt]|spending|expenses?)\s+(?:on|at|for)\s+(?:the\s+|my\s+)?(?P<key>[^?.!]+?)(?:\s+(?:this|last|previous)\s+month)?\s*[?.!]*\s*$",
    )
    .expect("valid regex")
});

static TOTAL_SPEND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:how much (?:did|have|do) i spen[dt]|what (?:did|have) i spen[dt]|total (?:spend|spending|spent|expenses?))\b",
    )
    .expect("valid regex")
});

static INCOME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:what(?:'s|\s+is|\s+was|\s+were)\s+my\s+(?:total\s+|monthly\s+)?(?:income|earnings)|how much (?:did|have|do) i (?:earn|earned|make|made|receive|received)|total (?:income|earnings))\b",
    )
    .expect("valid regex")
});

static TOP_CATEGORIES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:top (?:\d+ )?(?:spending |expense )?categor(?:y|ies)|spend(?:ing)? the most|biggest (?:expenses?|categor(?:y|ies))|highest spend(?:ing)?)\b",
    )
    .expect("valid regex")
});

static BUDGET_LEFT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bbudget\b.*\b(?:left|remaining|remain)\b|\b(?:left|remaining)\b.*\bbudget\b")
        .expect("valid regex")
});

static RECURRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\brecurring\b|\b(?:what|which|list|show)\b.*\b(?:subscriptions?|bills?)\b")
        .expect("valid regex")
});

static TRANSACTION_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bhow many (?:transactions|entries|payments|expenses)\b|\bnumber of transactions\b|\btransaction count\b",
    )
    .expect("valid regex")
});

static LAST_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:last|previous) month\b").expect("valid regex"));

/// Try to answer a chat question locally
pub fn quick_answer(query: &str, digest: &InsightDigest) -> Option<ChatAnswer> {
    let query = query.trim();
    let snapshot = if LAST_MONTH.is_match(query) {
        &digest.previous
    } else {
        &digest.current
    };

    if let Some(caps) = SPEND_ON.captures(query) {
        let key = caps["key"].trim();
        if !key.is_empty() {
            // "spend on food in May" captures more than a key; let the model read it
            return spend_on(key, snapshot);
        }
    }

    if TOTAL_SPEND.is_match(query) {
        return Some(total_spend(snapshot, digest));
    }

    if INCOME.is_match(query) {
        return Some(income(snapshot));
    }

    if TOP_CATEGORIES.is_match(query) {
        let top = top_by_amount(&snapshot.expense_categories, TOP_CATEGORY_COUNT);
        return Some(top_categories(&snapshot.period, &top));
    }

    if BUDGET_LEFT.is_match(query) {
        if let Some(status) = &digest.budget {
            return Some(budget_left(status));
        }
    }

    if RECURRING.is_match(query) {
        return Some(recurring(snapshot));
    }

    if TRANSACTION_COUNT.is_match(query) {
        return Some(transaction_count(snapshot));
    }

    None
}

/// "₹1,200" / "₹12,34,567.89" / "₹99.5" / "-₹40"
///
/// Digits are grouped the Indian way: the last three, then pairs.
pub fn format_rupees(amount: Decimal) -> String {
    let rounded = amount.round_dp(2).normalize();
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = rounded.abs().to_string();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole.to_string(), format!(".{}", fraction)),
        None => (text, String::new()),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        let remaining = whole.len() - i;
        if i > 0 && remaining >= 3 && (remaining - 3) % 2 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}₹{}{}", sign, grouped, fraction)
}

fn find<'a>(summaries: &'a [GroupSummary], key: &str) -> Option<&'a GroupSummary> {
    summaries.iter().find(|s| s.key.eq_ignore_ascii_case(key))
}

fn spend_on(key: &str, snapshot: &PeriodSnapshot) -> Option<ChatAnswer> {
    let summary = find(&snapshot.expense_categories, key).or_else(|| find(&snapshot.merchants, key))?;

    let entry = ChatEntry::new(
        summary.key.clone(),
        format!(
            "You spent {} at {} ({}) in {}.",
            format_rupees(summary.amount),
            summary.key,
            summary.entries_label(),
            snapshot.period.label()
        ),
    );

    Some(ChatAnswer {
        header: format!("Spending on {}", entry.header),
        entries: vec![entry],
    })
}

fn total_spend(snapshot: &PeriodSnapshot, digest: &InsightDigest) -> ChatAnswer {
    let label = snapshot.period.label();
    let totals = &snapshot.totals;

    if totals.expense_count == 0 {
        return ChatAnswer {
            header: "Total spending".to_string(),
            entries: vec![ChatEntry::new(label.clone(), format!("No expenses recorded for {}.", label))],
        };
    }

    let mut entries = vec![ChatEntry::new(
        label.clone(),
        format!(
            "You spent {} across {} in {}.",
            format_rupees(totals.expense),
            entries_label(totals.expense_count),
            label
        ),
    )];

    // Month-over-month only makes sense when answering for the current period
    if snapshot.period == digest.current.period {
        let previous = &digest.previous.totals;
        if let Some(change) = percent_change(totals.expense, previous.expense) {
            let direction = if change >= 0.0 { "more" } else { "less" };
            entries.push(ChatEntry::new(
                "Compared to last month",
                format!(
                    "That is {:.1}% {} than {} in {}.",
                    change.abs(),
                    direction,
                    format_rupees(previous.expense),
                    digest.previous.period.label()
                ),
            ));
        }
    }

    ChatAnswer {
        header: "Total spending".to_string(),
        entries,
    }
}

fn income(snapshot: &PeriodSnapshot) -> ChatAnswer {
    let label = snapshot.period.label();
    let totals = &snapshot.totals;

    let entries = if totals.income_count == 0 {
        vec![ChatEntry::new(label.clone(), format!("No income recorded for {}.", label))]
    } else {
        let mut entries = vec![ChatEntry::new(
            label.clone(),
            format!(
                "You received {} across {} in {}.",
                format_rupees(totals.income),
                entries_label(totals.income_count),
                label
            ),
        )];
        entries.extend(snapshot.income_categories.iter().map(|s| {
            ChatEntry::new(
                s.key.clone(),
                format!("{} in {} ({})", format_rupees(s.amount), s.key, s.entries_label()),
            )
        }));
        entries
    };

    ChatAnswer {
        header: "Income".to_string(),
        entries,
    }
}

fn top_categories(period: &Period, top: &[GroupSummary]) -> ChatAnswer {
    let entries = if top.is_empty() {
        let label = period.label();
        vec![ChatEntry::new(label.clone(), format!("No expenses recorded for {}.", label))]
    } else {
        top.iter()
            .enumerate()
            .map(|(i, s)| {
                ChatEntry::new(
                    format!("{}. {}", i + 1, s.key),
                    format!("{} at {} ({})", format_rupees(s.amount), s.key, s.entries_label()),
                )
            })
            .collect()
    };

    ChatAnswer {
        header: "Top spending categories".to_string(),
        entries,
    }
}

fn budget_left(status: &BudgetStatus) -> ChatAnswer {
    let mut entries = Vec::new();

    if status.remaining >= Decimal::ZERO {
        entries.push(ChatEntry::new(
            "Remaining Budget",
            format!(
                "You have {} left in your {} monthly budget.",
                format_rupees(status.remaining),
                format_rupees(status.budget)
            ),
        ));
        if let Some(daily) = status.daily_allowance {
            entries.push(ChatEntry::new(
                "Daily allowance",
                format!(
                    "That is about {} per day for the remaining {} days.",
                    format_rupees(Decimal::from_f64_retain(daily).unwrap_or_default()),
                    status.days_left
                ),
            ));
        }
    } else {
        entries.push(ChatEntry::new(
            "Over Budget",
            format!(
                "You are {} over your {} monthly budget.",
                format_rupees(-status.remaining),
                format_rupees(status.budget)
            ),
        ));
    }

    ChatAnswer {
        header: "Remaining budget".to_string(),
        entries,
    }
}

fn recurring(snapshot: &PeriodSnapshot) -> ChatAnswer {
    let entries = if snapshot.recurring.is_empty() {
        vec![ChatEntry::new("Recurring Bill", "No recurring bills for this month.")]
    } else {
        snapshot
            .recurring
            .iter()
            .map(|item| {
                let via = item
                    .method
                    .as_deref()
                    .map(|m| format!(" via {}", m))
                    .unwrap_or_default();
                ChatEntry::new(
                    item.name.clone(),
                    format!("{} in {}{}", format_rupees(item.amount), item.category, via),
                )
            })
            .collect()
    };

    ChatAnswer {
        header: "Recurring bills".to_string(),
        entries,
    }
}

fn transaction_count(snapshot: &PeriodSnapshot) -> ChatAnswer {
    let totals = &snapshot.totals;
    let label = snapshot.period.label();

    ChatAnswer {
        header: "Transactions".to_string(),
        entries: vec![ChatEntry::new(
            label.clone(),
            format!(
                "You made {} transactions in {} ({} expenses, {} income).",
                totals.count, label, totals.expense_count, totals.income_count
            ),
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Transaction;
    use crate::services::aggregation::build_digest;

    fn p(s: &str) -> Period {
        s.parse().unwrap()
    }

    fn expense(amount: i64, category: &str, period: &str) -> Transaction {
        Transaction::expense(Decimal::new(amount, 0), category).in_period(p(period))
    }

    fn sample() -> Vec<Transaction> {
        let mut swiggy = expense(100, "Food", "202506");
        swiggy.merchant = Some("Swiggy".to_string());
        let mut netflix = expense(649, "Subscriptions", "202506");
        netflix.is_recurring = true;
        netflix.merchant = Some("Netflix".to_string());
        netflix.method = Some("Card".to_string());

        vec![
            swiggy,
            expense(50, "Food", "202506"),
            expense(1200, "Shopping", "202506"),
            netflix,
            expense(100, "Food", "202505"),
            Transaction::income(Decimal::new(50000, 0), "Salary").in_period(p("202506")),
        ]
    }

    fn digest(budget: i64, days_left: i64) -> InsightDigest {
        build_digest(&sample(), &p("202506"), Decimal::new(budget, 0), days_left, None)
    }

    #[test]
    fn test_format_rupees() {
        assert_eq!(format_rupees(Decimal::new(150, 0)), "₹150");
        assert_eq!(format_rupees(Decimal::new(1200, 0)), "₹1,200");
        assert_eq!(format_rupees(Decimal::new(123456789, 2)), "₹12,34,567.89");
        assert_eq!(format_rupees(Decimal::new(100000, 0)), "₹1,00,000");
        assert_eq!(format_rupees(Decimal::new(-2500000, 0)), "-₹25,00,000");
        assert_eq!(format_rupees(Decimal::new(-40, 0)), "-₹40");
        assert_eq!(format_rupees(Decimal::ZERO), "₹0");
    }

    #[test]
    fn test_spend_on_category() {
        let answer = quick_answer("How much did I spend on food?", &digest(0, 0)).unwrap();
        assert_eq!(answer.header, "Spending on Food");
        assert_eq!(
            answer.entries[0].detail,
            "You spent ₹150 at Food (2 entries) in June 2025."
        );
    }

    #[test]
    fn test_spend_on_category_last_month() {
        let answer =
            quick_answer("how much did i spend on Food last month", &digest(0, 0)).unwrap();
        assert_eq!(
            answer.entries[0].detail,
            "You spent ₹100 at Food (1 entry) in May 2025."
        );
    }

    #[test]
    fn test_spend_on_merchant() {
        let answer = quick_answer("What did I spend at swiggy?", &digest(0, 0)).unwrap();
        assert_eq!(answer.entries[0].header, "Swiggy");
        assert!(answer.entries[0].detail.contains("₹100"));
    }

    #[test]
    fn test_spend_on_unknown_key_goes_to_model() {
        assert!(quick_answer("how much did I spend on travel?", &digest(0, 0)).is_none());
    }

    #[test]
    fn test_total_spend_with_comparison() {
        let answer = quick_answer("How much did I spend this month?", &digest(0, 0)).unwrap();
        assert_eq!(answer.header, "Total spending");
        assert_eq!(
            answer.entries[0].detail,
            "You spent ₹1,999 across 4 entries in June 2025."
        );
        assert_eq!(answer.entries.len(), 2);
        assert!(answer.entries[1].detail.contains("more than ₹100 in May 2025"));
    }

    #[test]
    fn test_income_question_forms() {
        for query in ["How much did I earn this month?", "total income", "what's my income"] {
            let answer = quick_answer(query, &digest(0, 0)).unwrap();
            assert_eq!(answer.header, "Income", "{}", query);
        }
    }

    #[test]
    fn test_income() {
        let answer = quick_answer("what is my income?", &digest(0, 0)).unwrap();
        assert_eq!(answer.header, "Income");
        assert!(answer.entries[0].detail.starts_with("You received ₹50,000 across 1 entry"));
        assert_eq!(answer.entries[1].header, "Salary");
    }

    #[test]
    fn test_top_categories() {
        let answer = quick_answer("show my top categories", &digest(0, 0)).unwrap();
        let headers: Vec<&str> = answer.entries.iter().map(|e| e.header.as_str()).collect();
        assert_eq!(headers, vec!["1. Shopping", "2. Subscriptions", "3. Food"]);
    }

    #[test]
    fn test_top_categories_last_month() {
        let answer = quick_answer("What were my top categories last month?", &digest(0, 0)).unwrap();
        assert_eq!(answer.entries.len(), 1);
        assert_eq!(answer.entries[0].header, "1. Food");
        assert_eq!(answer.entries[0].detail, "₹100 at Food (1 entry)");
    }

    #[test]
    fn test_recurring_last_month() {
        let answer = quick_answer("recurring bills last month?", &digest(0, 0)).unwrap();
        assert_eq!(answer.entries[0].detail, "No recurring bills for this month.");
    }

    #[test]
    fn test_budget_left_requires_budget() {
        let answer = quick_answer("How much budget is left?", &digest(10000, 10)).unwrap();
        assert_eq!(
            answer.entries[0].detail,
            "You have ₹8,001 left in your ₹10,000 monthly budget."
        );
        assert_eq!(
            answer.entries[1].detail,
            "That is about ₹800.1 per day for the remaining 10 days."
        );

        assert!(quick_answer("How much budget is left?", &digest(0, 10)).is_none());
    }

    #[test]
    fn test_over_budget() {
        let answer = quick_answer("remaining budget?", &digest(1000, 5)).unwrap();
        assert_eq!(answer.entries[0].header, "Over Budget");
        assert!(answer.entries[0].detail.starts_with("You are ₹999 over"));
    }

    #[test]
    fn test_recurring() {
        let answer = quick_answer("Which subscriptions do I pay for?", &digest(0, 0)).unwrap();
        assert_eq!(answer.entries[0].header, "Netflix");
        assert_eq!(answer.entries[0].detail, "₹649 in Subscriptions via Card");
    }

    #[test]
    fn test_transaction_count() {
        let answer = quick_answer("How many transactions did I make?", &digest(0, 0)).unwrap();
        assert_eq!(
            answer.entries[0].detail,
            "You made 5 transactions in June 2025 (4 expenses, 1 income)."
        );
    }

    #[test]
    fn test_open_question_goes_to_model() {
        assert!(quick_answer("Any tips to save more?", &digest(0, 0)).is_none());
        assert!(quick_answer("Why is my spending so high?", &digest(0, 0)).is_none());
        assert!(quick_answer("How much did I spend on food in May?", &digest(0, 0)).is_none());
        assert!(
            quick_answer("How much did I spend on food compared to last month?", &digest(0, 0)).is_none()
        );
        assert!(quick_answer("How can I increase my income?", &digest(0, 0)).is_none());
    }
}
