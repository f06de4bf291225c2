use anyhow::{Context, Result};
use colored::Colorize;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::config::Config;
use crate::{db, importers};

const PREVIEW_ROWS: usize = 10;

pub fn dispatch_import(path: &str, dry_run: bool, config: &Config, json_output: bool) -> Result<()> {
    tracing::info!("Importing postings from: {}", path);

    let postings = importers::import_postings_file(path, &config.default_currency)
        .with_context(|| format!("Error reading import file {}", path))?;

    if !json_output {
        println!(
            "\n{} Found {} postings\n",
            "✓".green().bold(),
            postings.len()
        );

        #[derive(Tabled)]
        struct PostingPreview {
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Account")]
            account: String,
            #[tabled(rename = "Commodity")]
            commodity: String,
            #[tabled(rename = "Quantity")]
            quantity: String,
            #[tabled(rename = "Amount")]
            amount: String,
        }

        let preview: Vec<PostingPreview> = postings
            .iter()
            .take(PREVIEW_ROWS)
            .map(|p| PostingPreview {
                date: p.date.format("%Y-%m-%d").to_string(),
                account: p.account.clone(),
                commodity: p.commodity.clone(),
                quantity: p.quantity.to_string(),
                amount: crate::utils::format_amount(p.amount),
            })
            .collect();

        let mut table = Table::new(&preview);
        table.with(Style::rounded());
        table.modify(Columns::new(3..), Alignment::right());
        println!("{}", table);

        if postings.len() > PREVIEW_ROWS {
            println!("\n... and {} more postings", postings.len() - PREVIEW_ROWS);
        }
    }

    if dry_run {
        if json_output {
            println!(
                "{}",
                serde_json::json!({ "parsed": postings.len(), "dry_run": true })
            );
        } else {
            println!("\n{} Dry run - no changes saved", "ℹ".blue().bold());
        }
        return Ok(());
    }

    let mut conn = super::open_database(config)?;
    let stats = db::import_postings(&mut conn, &postings)?;

    if json_output {
        println!(
            "{}",
            serde_json::json!({
                "parsed": postings.len(),
                "imported": stats.imported,
                "skipped": stats.skipped,
                "dry_run": false,
            })
        );
    } else {
        println!("\n{} Import complete!", "✓".green().bold());
        println!("  Imported: {}", stats.imported.to_string().green());
        if stats.skipped > 0 {
            println!(
                "  Skipped (duplicates): {}",
                stats.skipped.to_string().yellow()
            );
        }
    }

    Ok(())
}
