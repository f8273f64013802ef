//! Export subcommand implementation.
//!
//! Handles the `maltus export <session-id>` command for re-rendering saved
//! transcripts.

use crate::error::CliResult;
use crate::output;
use crate::transcript::{TranscriptFormat, TranscriptStore};
use crate::types::SessionId;
use clap::Parser;
use std::path::PathBuf;

/// Export a saved transcript.
#[derive(Parser, Debug)]
pub struct ExportCommand {
    /// Session ID or prefix to export
    ///
    /// Can be a full UUID or the first few characters (short ID).
    #[arg(value_name = "SESSION_ID")]
    pub session_id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: TranscriptFormat,

    /// Output file path (prints to stdout if not specified)
    #[arg(short = 'o', long = "output")]
    pub output_file: Option<PathBuf>,

    /// Export only open ports
    #[arg(long)]
    pub open_only: bool,
}

impl ExportCommand {
    /// Execute the export command.
    pub fn execute(&self, quiet: bool) -> CliResult<()> {
        SessionId::check_prefix(&self.session_id)?;

        let store = TranscriptStore::new()?;
        let mut transcript = store.find(&self.session_id)?;

        if self.open_only {
            transcript.entries.retain(|entry| entry.is_open());
        }

        match &self.output_file {
            Some(path) => {
                transcript.save(path, self.format)?;
                if !quiet {
                    output::print_success(&format!(
                        "Exported scan {} to {}",
                        transcript.session_id.short(),
                        path.display()
                    ));
                }
            }
            None => print!("{}", transcript.render(self.format)?),
        }

        Ok(())
    }
}
