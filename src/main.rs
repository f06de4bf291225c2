use std::io::IsTerminal;

use allocation::cli::Cli;
use allocation::config::Config;
use allocation::dispatcher;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Logs go to stderr so JSON on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.no_color || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!("Loaded config: {:?}", config);

    dispatcher::dispatch_command(cli.command, &config, cli.json)
}
