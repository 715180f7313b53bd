//! Summary command - group a transaction file without calling the model

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use rust_decimal::Decimal;

use finsight_core::domain::{annotate_periods, GroupBy, Period};
use finsight_core::services::aggregation::{self, TransactionFilter};
use finsight_core::services::quick_answer::format_rupees;

use super::{load_config, read_request};
use crate::output;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GroupByArg {
    Category,
    Merchant,
    Method,
}

impl From<GroupByArg> for GroupBy {
    fn from(arg: GroupByArg) -> Self {
        match arg {
            GroupByArg::Category => GroupBy::Category,
            GroupByArg::Merchant => GroupBy::Merchant,
            GroupByArg::Method => GroupBy::PaymentMethod,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Expense,
    Income,
    All,
}

impl KindArg {
    fn filter(self) -> TransactionFilter {
        match self {
            KindArg::Expense => TransactionFilter::expenses(),
            KindArg::Income => TransactionFilter::income(),
            KindArg::All => TransactionFilter::any(),
        }
    }
}

pub fn run(file: &Path, period: Option<&str>, by: GroupByArg, kind: KindArg, json: bool) -> Result<()> {
    let config = load_config()?;
    let offset = config.utc_offset()?;

    let mut request = read_request(file)?;
    let period: Period = period
        .or(request.period.as_deref())
        .context("No period given; pass --period YYYYMM")?
        .parse()?;

    annotate_periods(&mut request.transactions, &offset);
    let group_by = GroupBy::from(by);
    let groups = aggregation::group(&request.transactions, &period, &kind.filter(), group_by);

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    if groups.is_empty() {
        output::warning(&format!("No matching transactions for {}", period.label()));
        return Ok(());
    }

    println!("{}", format!("{} by {}", period.label(), group_by.field_name()).bold());
    println!();

    let mut table = output::create_table();
    table.set_header(vec![group_by.field_name(), "amount", "entries"]);
    for group in &groups {
        table.add_row(vec![
            group.key.clone(),
            format_rupees(group.amount),
            group.count.to_string(),
        ]);
    }

    let total = groups
        .iter()
        .fold(Decimal::ZERO, |acc, g| acc.saturating_add(g.amount));
    let count: usize = groups.iter().map(|g| g.count).sum();
    table.add_row(vec!["Total".to_string(), format_rupees(total), count.to_string()]);

    println!("{}", table);
    Ok(())
}
