use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::db::Posting;

/// Parse a postings CSV file.
///
/// Expected headers (any order, case-insensitive): `date`, `account`,
/// `amount`, and optionally `commodity` and `quantity`. Missing commodity
/// means `default_currency`; missing quantity means the amount.
pub fn parse_postings_csv<P: AsRef<Path>>(
    file_path: P,
    default_currency: &str,
) -> Result<Vec<Posting>> {
    let path = file_path.as_ref();
    info!("Parsing postings CSV file: {:?}", path);

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .context("Failed to open CSV file")?;

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();
    let columns = find_columns(&headers)?;
    debug!("Column mapping: {:?}", columns);

    let mut postings = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.context("Failed to read CSV record")?;
        // Header is line 1
        let line = idx + 2;

        match parse_row(&record, &columns, default_currency) {
            Ok(Some(posting)) => postings.push(posting),
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping row {}: {}", line, e);
                continue;
            }
        }
    }

    info!("Successfully parsed {} postings from CSV", postings.len());
    Ok(postings)
}

#[derive(Debug)]
struct ColumnMapping {
    date: usize,
    account: usize,
    amount: usize,
    commodity: Option<usize>,
    quantity: Option<usize>,
}

fn find_columns(headers: &StringRecord) -> Result<ColumnMapping> {
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    Ok(ColumnMapping {
        date: position("date").ok_or_else(|| anyhow!("Date column not found"))?,
        account: position("account").ok_or_else(|| anyhow!("Account column not found"))?,
        amount: position("amount").ok_or_else(|| anyhow!("Amount column not found"))?,
        commodity: position("commodity"),
        quantity: position("quantity"),
    })
}

fn parse_row(
    record: &StringRecord,
    columns: &ColumnMapping,
    default_currency: &str,
) -> Result<Option<Posting>> {
    let field = |idx: usize| record.get(idx).unwrap_or("").trim();

    // Blank lines come through as a single empty field
    if record.iter().all(|f| f.trim().is_empty()) {
        return Ok(None);
    }

    let date = super::parse_date(field(columns.date))?;
    let account = field(columns.account);
    if account.is_empty() {
        return Err(anyhow!("empty account"));
    }
    let amount = parse_decimal(field(columns.amount))?;

    let commodity = columns
        .commodity
        .map(field)
        .filter(|c| !c.is_empty())
        .unwrap_or(default_currency);
    let quantity = match columns.quantity.map(field).filter(|q| !q.is_empty()) {
        Some(q) => parse_decimal(q)?,
        None => amount,
    };

    let mut posting = Posting::new(date, account, commodity, amount).with_quantity(quantity);
    posting.source = "CSV".to_string();
    Ok(Some(posting))
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    let cleaned = s.replace(',', "");
    Decimal::from_str(&cleaned).map_err(|e| anyhow!("invalid number '{}': {}", s, e))
}
