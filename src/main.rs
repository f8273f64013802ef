//! Maltus command-line entry point.

use anyhow::Context;
use clap::Parser;
use maltus::cli::{Cli, Commands};
use maltus::config::AppSettings;
use maltus::output;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = match &cli.config {
        Some(path) => AppSettings::load_from(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => AppSettings::load().context("failed to load settings")?,
    };

    match &cli.command {
        Commands::Scan(cmd) => cmd.execute(&settings, cli.quiet).await?,
        Commands::History(cmd) => cmd.execute(cli.quiet)?,
        Commands::Export(cmd) => cmd.execute(cli.quiet)?,
        Commands::Settings(cmd) => cmd.execute(&settings, cli.quiet)?,
    }

    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` wins over the flags.
fn init_logging(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "maltus=debug"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
