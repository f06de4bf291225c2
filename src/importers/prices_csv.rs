use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::db::Price;

/// Parse a price history CSV with `date`, `commodity` and `price` columns.
pub fn parse_prices_csv<P: AsRef<Path>>(file_path: P) -> Result<Vec<Price>> {
    let path = file_path.as_ref();
    info!("Parsing prices CSV file: {:?}", path);

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .context("Failed to open CSV file")?;

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("{} column not found", name))
    };
    let date_idx = position("date")?;
    let commodity_idx = position("commodity")?;
    let price_idx = position("price")?;

    let mut prices = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.context("Failed to read CSV record")?;
        let line = idx + 2;

        let parsed = (|| -> Result<Price> {
            let date = super::parse_date(record.get(date_idx).unwrap_or(""))?;
            let commodity = record.get(commodity_idx).unwrap_or("");
            if commodity.is_empty() {
                return Err(anyhow!("empty commodity"));
            }
            let raw = record.get(price_idx).unwrap_or("");
            let value = Decimal::from_str(&raw.replace(',', ""))
                .map_err(|e| anyhow!("invalid price '{}': {}", raw, e))?;
            let mut price = Price::new(commodity, date, value);
            price.source = "CSV".to_string();
            Ok(price)
        })();

        match parsed {
            Ok(price) => prices.push(price),
            Err(e) => warn!("Skipping row {}: {}", line, e),
        }
    }

    info!("Successfully parsed {} prices from CSV", prices.len());
    Ok(prices)
}
