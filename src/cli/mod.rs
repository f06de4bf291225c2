use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser, Debug)]
#[command(name = "allocation")]
#[command(version, about = "Ledger asset allocation snapshots and timelines")]
#[command(
    long_about = "Import ledger postings and price history, then report per-account totals and market values for every level of the account hierarchy, today and for each day since the first posting."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database if it does not exist
    Init,

    /// Import postings from a CSV file (date,account,amount[,commodity,quantity])
    Import {
        /// Path to the CSV file
        file: String,

        /// Preview only, don't save to database
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Price history management
    Prices {
        #[command(subcommand)]
        action: PriceCommands,
    },

    /// Allocation reports
    Allocation {
        #[command(subcommand)]
        action: AllocationCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum PriceCommands {
    /// Import prices from a CSV file (date,commodity,price)
    Import {
        /// Path to the CSV file
        file: String,
    },

    /// List stored prices
    List {
        /// Only this commodity
        commodity: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AllocationCommands {
    /// Show per-account totals and market values as of now
    Show {
        /// Treat this date's start as "now" (YYYY-MM-DD, YYYY-MM, or YYYY)
        #[arg(long)]
        now: Option<String>,
    },

    /// Show the daily allocation history
    Timeline {
        /// Treat this date's start as "now" (YYYY-MM-DD, YYYY-MM, or YYYY)
        #[arg(long)]
        now: Option<String>,

        /// Only print the most recent N days
        #[arg(long)]
        last: Option<usize>,
    },
}
