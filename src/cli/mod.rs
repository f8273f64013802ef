//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `maltus scan <host>` - Scan a port range on one host
//! - `maltus history` - List saved transcripts
//! - `maltus export <session-id>` - Re-render a saved transcript
//! - `maltus settings` - Show or initialise the settings file

mod export;
mod history;
mod scan;
mod settings;

pub use export::ExportCommand;
pub use history::HistoryCommand;
pub use scan::ScanCommand;
pub use settings::SettingsCommand;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Maltus - a concurrent TCP port scanner.
///
/// Probes every port of an inclusive range with a bounded number of
/// concurrent connection attempts and reports results in ascending port
/// order. Press Ctrl-C to stop a scan early; ports already being probed
/// still report.
#[derive(Parser, Debug)]
#[command(name = "maltus")]
#[command(author = "HueCodes <huecodes@proton.me>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A concurrent TCP port scanner", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to custom settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a host for open ports
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// List saved scan transcripts
    #[command(alias = "h")]
    History(HistoryCommand),

    /// Export a saved scan transcript
    #[command(alias = "e")]
    Export(ExportCommand),

    /// Show or initialise settings
    Settings(SettingsCommand),
}
