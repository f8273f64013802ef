//! Scan subcommand implementation.
//!
//! Handles the `maltus scan <host>` command for port scanning.

use crate::config::AppSettings;
use crate::error::{CliError, CliResult};
use crate::output::{self, ConsoleSink};
use crate::session::{ScanEngine, ScanSummary, SessionHandle};
use crate::transcript::{TranscriptFormat, TranscriptSink, TranscriptStore};
use crate::types::{DnsResolver, PortRange, Resolver};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Scan a host for open ports.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Target hostname or IP address
    #[arg(value_name = "HOST")]
    pub host: String,

    /// First port of the range (inclusive)
    #[arg(short = 's', long)]
    pub start: Option<u32>,

    /// Last port of the range (inclusive)
    #[arg(short = 'e', long)]
    pub end: Option<u32>,

    /// Port range as START-END, instead of --start/--end
    #[arg(short = 'p', long, conflicts_with_all = ["start", "end"])]
    pub ports: Option<String>,

    /// Maximum number of concurrent probes
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Connection timeout in milliseconds
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,

    /// Only list open ports and errors
    #[arg(long)]
    pub hide_closed: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Write the transcript to this file when the scan ends
    #[arg(long, value_name = "PATH")]
    pub save: Option<PathBuf>,

    /// Transcript format for --save (defaults from the file extension)
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<TranscriptFormat>,

    /// Keep the transcript in the history store
    #[arg(long)]
    pub keep: bool,
}

impl ScanCommand {
    /// Execute the scan command.
    pub async fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        let (start, end) = self.bounds(settings)?;

        let mut options = settings.session_options();
        if let Some(concurrency) = self.concurrency {
            options = options.with_concurrency(concurrency);
        }
        if let Some(timeout_ms) = self.timeout {
            options = options.with_timeout(Duration::from_millis(timeout_ms));
        }

        let target = DnsResolver::new().resolve(&self.host).await;
        debug!(%target, start, end, "target resolved");

        // Fatal validation happens here, before anything is printed
        let session = ScanEngine::tcp().create_session(target, start, end, options)?;

        let show_closed = settings.show_closed && !self.hide_closed;
        let recorder = TranscriptSink::new();
        session.subscribe(ConsoleSink::new(
            session.range().len(),
            show_closed,
            !quiet && !self.no_progress,
        ))?;
        session.subscribe(recorder.clone())?;

        if !quiet {
            let ip = session
                .target()
                .ip
                .map(|ip| ip.to_string())
                .unwrap_or_default();
            output::print_scan_header(
                &session.target().original,
                &ip,
                &session.range().to_string(),
                session.range().len(),
            );
        }

        session.start()?;
        let summary = run_until_done(&session).await?;

        if !quiet {
            output::print_summary(&summary);
        }

        let transcript = recorder
            .transcript()
            .ok_or_else(|| CliError::Other("scan ended without a transcript".to_string()))?;

        if let Some(path) = &self.save {
            let format = self
                .format
                .unwrap_or_else(|| TranscriptFormat::from_path(path));
            transcript.save(path, format)?;
            if !quiet {
                output::print_success(&format!("Transcript saved to {}", path.display()));
            }
        }

        if self.keep || settings.auto_save_transcripts {
            let store = TranscriptStore::new()?;
            store.save(&transcript)?;
            if !quiet {
                output::print_info(&format!(
                    "Scan saved as {}",
                    transcript.session_id.short()
                ));
            }
        }

        Ok(())
    }

    /// Raw range bounds from flags, falling back to settings.
    fn bounds(&self, settings: &AppSettings) -> CliResult<(u32, u32)> {
        if let Some(ports) = &self.ports {
            return Ok(PortRange::parse_bounds(ports)?);
        }
        Ok((
            self.start.unwrap_or(settings.default_start_port),
            self.end.unwrap_or(settings.default_end_port),
        ))
    }
}

/// Wait for the session, turning Ctrl-C into a cooperative stop.
async fn run_until_done(session: &SessionHandle) -> CliResult<ScanSummary> {
    let finished = tokio::select! {
        summary = session.wait() => summary,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            if session.request_stop() {
                output::print_warning("Stopping: waiting for in-flight probes...");
            }
            session.wait().await
        }
    };

    finished.ok_or_else(|| CliError::Other("scan ended without a summary".to_string()))
}
