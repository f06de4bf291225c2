use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::formatters;
use crate::config::Config;
use crate::{db, importers};

pub fn dispatch_prices_import(path: &str, config: &Config, json_output: bool) -> Result<()> {
    tracing::info!("Importing prices from: {}", path);

    let prices = importers::import_prices_file(path)
        .with_context(|| format!("Error reading price file {}", path))?;

    let mut conn = super::open_database(config)?;
    let tx = conn.transaction()?;
    for price in &prices {
        db::insert_price(&tx, price)?;
    }
    tx.commit()?;

    if json_output {
        println!("{}", serde_json::json!({ "imported": prices.len() }));
    } else {
        println!(
            "{} Imported {} prices",
            "✓".green().bold(),
            prices.len().to_string().green()
        );
    }
    Ok(())
}

pub fn dispatch_prices_list(commodity: Option<&str>, config: &Config, json_output: bool) -> Result<()> {
    let conn = super::open_database(config)?;
    let prices = db::list_prices(&conn, commodity)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&prices)?);
    } else {
        print!("{}", formatters::format_prices_table(&prices));
    }
    Ok(())
}
