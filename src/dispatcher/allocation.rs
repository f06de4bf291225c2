use anyhow::Result;
use chrono::NaiveDateTime;

use crate::cli::formatters;
use crate::config::Config;
use crate::db::SqlitePostingSource;
use crate::pricing::PriceHistoryValuator;
use crate::reports::{self, AllocationReport};

fn build_report(now: NaiveDateTime, config: &Config) -> Result<AllocationReport> {
    let conn = super::open_database(config)?;
    let source = SqlitePostingSource::new(&conn, config.account_prefix.clone());
    let valuator = PriceHistoryValuator::new(&conn, config.default_currency.clone());
    reports::generate_allocation(&source, &valuator, now)
}

pub fn dispatch_allocation_show(now: NaiveDateTime, config: &Config, json_output: bool) -> Result<()> {
    tracing::info!("Generating allocation report as of {}", now);

    let report = build_report(now, config)?;

    if json_output {
        println!("{}", formatters::format_allocation_json(&report));
        return Ok(());
    }

    if report.is_empty() {
        println!("{}", formatters::format_empty_allocation());
        return Ok(());
    }

    println!(
        "{}",
        formatters::format_allocation_table(&report, now, &config.default_currency)
    );
    Ok(())
}

pub fn dispatch_allocation_timeline(
    now: NaiveDateTime,
    last: Option<usize>,
    config: &Config,
    json_output: bool,
) -> Result<()> {
    tracing::info!("Generating allocation timeline up to {}", now);

    let report = build_report(now, config)?;

    if json_output {
        println!(
            "{}",
            formatters::format_timeline_json(&report.aggregates_timeline, last)
        );
        return Ok(());
    }

    if report.aggregates_timeline.is_empty() {
        println!("{}", formatters::format_empty_allocation());
        return Ok(());
    }

    println!(
        "{}",
        formatters::format_timeline_table(
            &report.aggregates_timeline,
            last,
            &config.default_currency
        )
    );
    Ok(())
}
