//! Prompt construction for insight and chat requests
//!
//! The model gets the locally computed digest plus a capped slice of the
//! raw transactions for the current and previous period. Totals in the
//! digest are authoritative; the raw rows are there for detail.

use crate::domain::result::Result;
use crate::domain::{InsightDigest, Transaction};
use crate::services::aggregation::in_periods;

pub const SYSTEM_PROMPT: &str = "You are a smart finance assistant.";

/// System and user message for one completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

const DATA_RULES: &str = r#"Strict Data Rules:
- Amounts, counts and comparisons must come from the "digest" below. It was computed exactly from the user's transactions; never recompute or estimate totals.
- "Type" 0 is an expense and "Type" 1 is income. Every transaction carries a "Period" ("YYYYMM").
- Use only the current period for main insights and only the previous period for comparisons. Never use data from any other period.
- If there is no data for a category, period, or type, say "No data for this period" for that group.
- Whenever you mention spending, use the format "₹{amt} at {category} ({count} entries)". Use "entry" for one and "entries" for more than one."#;

const INSIGHT_TASK: &str = r#"TASK:
Write insight groups for the current period, speaking directly to the user. Be positive, conversational, and concise, and tie every suggestion to an actual amount, category, and entry count.

insight_groups must include, as relevant:
- A top-level summary (type "Summary") for this period
- Income vs Expense
- Expense Comparison against the previous period (skip categories with no previous data)
- Remaining Budget, only when a budget is given: "You have ₹1,200 left in your ₹10,000 monthly budget."
- High Spend: the top 3 categories, each listed once
- Categories with the highest change vs last month
- Payment Method, noting heavy card usage and suggesting UPI or cash for better control
- Merchant Insights: "You placed 7 orders from Amazon this month (₹5,800 total)."
- Recurring Bill: every recurring transaction of the period, or "No recurring bills for this month."
- Forecast, Saving Tip, Savings Trend, Cash Flow
- At least 5 unique Smart Suggestions, none repeating a category and amount used elsewhere

Format each group:
{"header":"...","detail":"...","type":"...","category":"...","transactions":[...]}
Output ONLY this JSON (no explanations or commentary):
{"insight_groups":[...]}"#;

const CHAT_TASK: &str = r#"TASK:
Answer the user's query with a friendly, data-driven message as if speaking directly to them. If the query names a category, amount, period, trend, or comparison, answer with the matching figures. If there is no data for what was asked, say so clearly.

Output ONLY this JSON (no explanations or commentary):
{"chat": {"header": "...", "entries": [{"header": "...", "detail": "..."}]}, "insight_groups": [...]}"#;

/// Prompt for monthly insight groups
pub fn build_insight_prompt(
    digest: &InsightDigest,
    transactions: &[Transaction],
    max_transactions: usize,
) -> Result<Prompt> {
    let intro = "You are an advanced finance insight assistant for a personal expense tracker app.";
    let data = input_data(digest, transactions, max_transactions)?;

    Ok(Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user: format!("{}\n\n{}\n\n{}\n\n{}", intro, DATA_RULES, INSIGHT_TASK, data),
    })
}

/// Prompt for a free-form chat question
pub fn build_chat_prompt(
    digest: &InsightDigest,
    transactions: &[Transaction],
    max_transactions: usize,
    query: &str,
) -> Result<Prompt> {
    let intro = "You are an advanced finance chat assistant for a personal expense tracker app.";
    let data = input_data(digest, transactions, max_transactions)?;

    // JSON-encode the query so quotes in it cannot break out of the prompt
    let query = serde_json::to_string(query)?;

    Ok(Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user: format!(
            "{}\n\n{}\n\n{}\n\n{}\nquery: {}",
            intro, DATA_RULES, CHAT_TASK, data, query
        ),
    })
}

fn input_data(
    digest: &InsightDigest,
    transactions: &[Transaction],
    max_transactions: usize,
) -> Result<String> {
    let period = digest.current.period;
    let prev_period = digest.previous.period;

    let relevant = in_periods(transactions, &[period, prev_period]);
    let total = relevant.len();
    let shown: Vec<&Transaction> = relevant.into_iter().take(max_transactions).collect();

    let mut out = String::from("Input data:\n");
    out.push_str(&format!("period: {}\n", period));
    out.push_str(&format!("prev_period: {}\n", prev_period));
    match &digest.budget {
        Some(status) => out.push_str(&format!("budget: {}\n", status.budget.normalize())),
        None => out.push_str("budget: 0 (no budget set, ignore)\n"),
    }
    out.push_str(&format!("days_left: {}\n", digest.days_left));
    out.push_str(&format!("digest: {}\n", serde_json::to_string(digest)?));
    out.push_str(&format!("transactions: {}\n", serde_json::to_string(&shown)?));
    if shown.len() < total {
        out.push_str(&format!(
            "note: only the first {} of {} transactions for these periods are listed; the digest covers all of them.\n",
            shown.len(),
            total
        ));
    }

    Ok(out)
}
