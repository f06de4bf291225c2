// Import module - postings and price history from CSV files

pub mod postings_csv;
pub mod prices_csv;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::path::Path;
use tracing::info;

use crate::db::{Posting, Price};

pub use postings_csv::parse_postings_csv;
pub use prices_csv::parse_prices_csv;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a ledger date (`YYYY-MM-DD` or `YYYY/MM/DD`)
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .ok_or_else(|| anyhow!("invalid date '{}'", s))
}

fn check_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| anyhow!("File has no extension"))?
        .to_lowercase();

    match extension.as_str() {
        "csv" | "txt" => Ok(()),
        _ => Err(anyhow!(
            "Unsupported file format: {}. Supported formats: .csv",
            extension
        )),
    }
}

/// Import postings from a file (CSV)
pub fn import_postings_file<P: AsRef<Path>>(
    file_path: P,
    default_currency: &str,
) -> Result<Vec<Posting>> {
    let path = file_path.as_ref();
    check_extension(path)?;
    info!("Importing postings file: {:?}", path);
    parse_postings_csv(path, default_currency)
}

/// Import prices from a file (CSV)
pub fn import_prices_file<P: AsRef<Path>>(file_path: P) -> Result<Vec<Price>> {
    let path = file_path.as_ref();
    check_extension(path)?;
    info!("Importing prices file: {:?}", path);
    parse_prices_csv(path)
}
