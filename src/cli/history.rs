//! History subcommand implementation.
//!
//! Lists and prunes transcripts kept in the store.

use crate::error::CliResult;
use crate::output;
use crate::transcript::TranscriptStore;
use clap::Parser;
use console::style;

/// View and manage saved scans.
#[derive(Parser, Debug)]
pub struct HistoryCommand {
    /// Number of recent scans to show
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,

    /// Delete all saved scans
    #[arg(long)]
    pub clear: bool,
}

impl HistoryCommand {
    /// Execute the history command.
    pub fn execute(&self, quiet: bool) -> CliResult<()> {
        let store = TranscriptStore::new()?;

        if self.clear {
            let deleted = store.clear()?;
            if !quiet {
                output::print_success(&format!("Deleted {} saved scans", deleted));
            }
            return Ok(());
        }

        let transcripts = store.list()?;

        if transcripts.is_empty() {
            if !quiet {
                output::print_info("No saved scans.");
            }
            return Ok(());
        }

        for transcript in transcripts.iter().take(self.count) {
            println!(
                "{}  {}  {}",
                style(transcript.session_id.short()).dim(),
                transcript.started_at.format("%Y-%m-%d %H:%M:%S"),
                transcript.summary()
            );
        }

        Ok(())
    }
}
