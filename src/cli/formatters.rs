//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of data calculation from presentation.

use chrono::NaiveDateTime;
use colored::Colorize;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::db::{Price, ACCOUNT_SEPARATOR};
use crate::reports::{Aggregate, AllocationReport, Snapshot};
use crate::utils::{format_amount, format_money};

/// Sum of amount and market amount over every entry of a snapshot.
///
/// Ancestor placeholders hold zero, so this is the total of the postings.
pub fn snapshot_totals(snapshot: &Snapshot) -> (Decimal, Decimal) {
    snapshot.values().fold((Decimal::ZERO, Decimal::ZERO), |acc, a| {
        (acc.0 + a.amount, acc.1 + a.market_amount)
    })
}

fn colored_gain(gain: Decimal) -> String {
    let text = format_amount(gain);
    if gain > Decimal::ZERO {
        text.green().to_string()
    } else if gain < Decimal::ZERO {
        text.red().to_string()
    } else {
        text
    }
}

/// Account label indented by depth, showing only the last segment
fn indented_account(account: &str) -> String {
    let depth = account.matches(ACCOUNT_SEPARATOR).count();
    let leaf = account
        .rsplit(ACCOUNT_SEPARATOR)
        .next()
        .unwrap_or(account);
    format!("{}{}", "  ".repeat(depth), leaf)
}

/// Orders accounts segment by segment so children follow their parent
fn by_account_path(a: &Aggregate, b: &Aggregate) -> Ordering {
    a.account
        .split(ACCOUNT_SEPARATOR)
        .cmp(b.account.split(ACCOUNT_SEPARATOR))
}

/// Format the "now" snapshot as a tree-ordered table
pub fn format_allocation_table(report: &AllocationReport, now: NaiveDateTime, commodity: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n{} Allocation as of {}\n\n",
        "📊".cyan().bold(),
        now.format("%Y-%m-%d %H:%M")
    ));

    #[derive(Tabled)]
    struct AllocationRow {
        #[tabled(rename = "Account")]
        account: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "Market Value")]
        market_value: String,
        #[tabled(rename = "Gain")]
        gain: String,
    }

    let rows: Vec<AllocationRow> = report
        .aggregates
        .values()
        .sorted_by(|a, b| by_account_path(a, b))
        .map(|a| AllocationRow {
            account: indented_account(&a.account),
            amount: format_amount(a.amount),
            market_value: format_amount(a.market_amount),
            gain: colored_gain(a.market_amount - a.amount),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());
    output.push_str(&table.to_string());

    let (amount, market) = snapshot_totals(&report.aggregates);
    output.push_str(&format!("\n\n{} Summary", "━".repeat(60).bright_black()));
    output.push_str(&format!(
        "\n{:<20} {}",
        "Total Amount:".bold(),
        format_money(amount, commodity)
    ));
    output.push_str(&format!(
        "\n{:<20} {}",
        "Market Value:".bold(),
        format_money(market, commodity)
    ));
    output.push_str(&format!(
        "\n{:<20} {}\n",
        "Gain:".bold(),
        colored_gain(market - amount)
    ));

    output
}

/// Format the daily timeline, one row per day
pub fn format_timeline_table(timeline: &[Snapshot], last: Option<usize>, commodity: &str) -> String {
    let mut output = String::new();

    #[derive(Tabled)]
    struct TimelineRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Accounts")]
        accounts: usize,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "Market Value")]
        market_value: String,
    }

    let skip = last.map_or(0, |n| timeline.len().saturating_sub(n));
    let rows: Vec<TimelineRow> = timeline
        .iter()
        .skip(skip)
        .filter_map(|snapshot| {
            let date = snapshot.values().next()?.date;
            let (amount, market) = snapshot_totals(snapshot);
            Some(TimelineRow {
                date: date.format("%Y-%m-%d").to_string(),
                accounts: snapshot.len(),
                amount: format_amount(amount),
                market_value: format_amount(market),
            })
        })
        .collect();

    output.push_str(&format!(
        "\n{} Allocation timeline ({} of {} days, {})\n\n",
        "📈".cyan().bold(),
        rows.len(),
        timeline.len(),
        commodity
    ));

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());
    output.push_str(&table.to_string());
    output.push('\n');

    output
}

/// Entries of a snapshot sorted by account, for stable JSON output
#[derive(Serialize)]
struct JsonAggregate<'a> {
    date: String,
    account: &'a str,
    amount: String,
    market_amount: String,
}

fn json_snapshot(snapshot: &Snapshot) -> Vec<JsonAggregate<'_>> {
    snapshot
        .values()
        .sorted_by(|a, b| by_account_path(a, b))
        .map(|a| JsonAggregate {
            date: a.date.to_string(),
            account: &a.account,
            amount: a.amount.to_string(),
            market_amount: a.market_amount.to_string(),
        })
        .collect()
}

#[derive(Serialize)]
struct JsonReport<'a> {
    aggregates: BTreeMap<&'a str, JsonAggregate<'a>>,
    aggregates_timeline: Vec<Vec<JsonAggregate<'a>>>,
}

/// Format the full report as JSON (`aggregates` + `aggregates_timeline`).
///
/// `aggregates` is keyed by account in sorted order; each timeline day uses
/// the same sorted entry lists as `format_timeline_json`.
pub fn format_allocation_json(report: &AllocationReport) -> String {
    let json = JsonReport {
        aggregates: json_snapshot(&report.aggregates)
            .into_iter()
            .map(|entry| (entry.account, entry))
            .collect(),
        aggregates_timeline: report.aggregates_timeline.iter().map(json_snapshot).collect(),
    };
    serde_json::to_string_pretty(&json)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Format the timeline as a JSON array of per-day sorted entry lists
pub fn format_timeline_json(timeline: &[Snapshot], last: Option<usize>) -> String {
    let skip = last.map_or(0, |n| timeline.len().saturating_sub(n));
    let days: Vec<Vec<JsonAggregate<'_>>> = timeline.iter().skip(skip).map(json_snapshot).collect();
    serde_json::to_string_pretty(&days)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Format stored prices
pub fn format_prices_table(prices: &[Price]) -> String {
    if prices.is_empty() {
        return format!("{} No prices stored\n", "ℹ".blue().bold());
    }

    #[derive(Tabled)]
    struct PriceRow {
        #[tabled(rename = "Commodity")]
        commodity: String,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Source")]
        source: String,
    }

    let rows: Vec<PriceRow> = prices
        .iter()
        .map(|p| PriceRow {
            commodity: p.commodity.clone(),
            date: p.price_date.format("%Y-%m-%d").to_string(),
            price: p.value.to_string(),
            source: p.source.clone(),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(2..3), Alignment::right());
    format!("{}\n", table)
}

/// Format empty ledger message
pub fn format_empty_allocation() -> String {
    format!(
        "{} No postings found\nImport postings first using: {} import <file>\n",
        "ℹ".blue().bold(),
        "allocation".bold()
    )
}
