//! Settings subcommand implementation.

use crate::config::{AppSettings, Paths};
use crate::error::{CliError, CliResult};
use crate::output;
use clap::Parser;

/// Show the effective settings, or write a default settings file.
#[derive(Parser, Debug)]
pub struct SettingsCommand {
    /// Write the default settings file (overwrites an existing one)
    #[arg(long)]
    pub init: bool,
}

impl SettingsCommand {
    /// Execute the settings command.
    pub fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        if self.init {
            let path = AppSettings::default().save()?;
            if !quiet {
                output::print_success(&format!("Wrote {}", path.display()));
            }
            return Ok(());
        }

        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| CliError::Other(e.to_string()))?;
        println!("{}", json);
        if !quiet {
            output::print_info(&format!("Settings file: {}", Paths::get()?.settings_file().display()));
        }
        Ok(())
    }
}
