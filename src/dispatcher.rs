//! Command dispatcher that routes parsed clap commands to their handlers.
//!
//! Handlers own the I/O: loading postings and prices from the database and
//! printing tables or JSON. The report computation itself lives in `reports`.

mod allocation;
mod imports;
mod prices;

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, NaiveTime};
use colored::Colorize;
use rusqlite::Connection;

use crate::cli::{AllocationCommands, Commands, PriceCommands};
use crate::config::Config;
use crate::db;

/// Route a parsed command to its handler
pub fn dispatch_command(command: Commands, config: &Config, json_output: bool) -> Result<()> {
    match command {
        Commands::Init => dispatch_init(config, json_output),
        Commands::Import { file, dry_run } => {
            imports::dispatch_import(&file, dry_run, config, json_output)
        }
        Commands::Prices { action } => match action {
            PriceCommands::Import { file } => {
                prices::dispatch_prices_import(&file, config, json_output)
            }
            PriceCommands::List { commodity } => {
                prices::dispatch_prices_list(commodity.as_deref(), config, json_output)
            }
        },
        Commands::Allocation { action } => match action {
            AllocationCommands::Show { now } => {
                let now = resolve_now(now.as_deref())?;
                allocation::dispatch_allocation_show(now, config, json_output)
            }
            AllocationCommands::Timeline { now, last } => {
                let now = resolve_now(now.as_deref())?;
                allocation::dispatch_allocation_timeline(now, last, config, json_output)
            }
        },
    }
}

fn dispatch_init(config: &Config, json_output: bool) -> Result<()> {
    let path = match config.db_path.clone() {
        Some(p) => p,
        None => db::get_default_db_path()?,
    };
    db::init_database(Some(path.clone()))?;

    if json_output {
        println!("{}", serde_json::json!({ "db_path": path }));
    } else {
        println!("{} Database ready at {}", "✓".green().bold(), path.display());
    }
    Ok(())
}

/// Open the configured database, creating the schema if needed
pub(crate) fn open_database(config: &Config) -> Result<Connection> {
    let conn = db::open_db(config.db_path.clone())?;
    db::apply_schema(&conn).context("Failed to prepare database schema")?;
    Ok(conn)
}

/// The report's "now": start of the given date, or the current local time
pub(crate) fn resolve_now(arg: Option<&str>) -> Result<NaiveDateTime> {
    match arg {
        Some(s) => Ok(crate::utils::parse_flexible_date(s)?.and_time(NaiveTime::MIN)),
        None => Ok(chrono::Local::now().naive_local()),
    }
}
