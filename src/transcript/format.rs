//! Transcript rendering: plain text report, JSON and CSV.

use super::record::Transcript;
use crate::error::{TranscriptError, TranscriptResult};
use chrono::Local;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const RULE: &str = "========================================";

/// Output format for transcripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TranscriptFormat {
    /// Human-readable report
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl TranscriptFormat {
    /// Guess a format from a file extension, defaulting to plain text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Plain,
        }
    }
}

impl std::fmt::Display for TranscriptFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl Transcript {
    /// Render the transcript in the given format.
    pub fn render(&self, format: TranscriptFormat) -> TranscriptResult<String> {
        match format {
            TranscriptFormat::Plain => Ok(self.render_plain()),
            TranscriptFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            TranscriptFormat::Csv => self.render_csv(),
        }
    }

    /// Plain text report: header, one line per port, completion trailer.
    pub fn render_plain(&self) -> String {
        let started = self.started_at.with_timezone(&Local);
        let finished = self.finished_at.with_timezone(&Local);
        let host = match self.target.ip {
            Some(ip) => format!("{} ({})", self.target.original, ip),
            None => self.target.original.clone(),
        };

        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "SCAN REPORT");
        let _ = writeln!(out, "Target: {host}");
        let _ = writeln!(out, "Ports: {}", self.range);
        let _ = writeln!(out, "Started: {}", started.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out);

        for entry in &self.entries {
            let state = match (entry.status.as_str(), &entry.reason) {
                ("open", _) => "OPEN".to_string(),
                ("error", Some(reason)) => format!("error ({reason})"),
                (other, _) => other.to_string(),
            };
            let _ = writeln!(out, "Port {:>5} : {}", entry.port, state);
        }

        if self.was_stopped {
            let _ = writeln!(out);
            let _ = writeln!(out, "[!] Scan stopped by user.");
        }

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "--- Scan Complete at {} ---",
            finished.format("%H:%M:%S")
        );
        out
    }

    fn render_csv(&self) -> TranscriptResult<String> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["port", "status", "reason"])?;
        for entry in &self.entries {
            wtr.write_record([
                entry.port.to_string().as_str(),
                entry.status.as_str(),
                entry.reason.as_deref().unwrap_or(""),
            ])?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| TranscriptError::SaveFailed(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| TranscriptError::SaveFailed(e.to_string()))
    }

    /// Write the rendered transcript to `path`.
    pub fn save(&self, path: &Path, format: TranscriptFormat) -> TranscriptResult<()> {
        let content = self.render(format)?;
        fs::write(path, content)
            .map_err(|e| TranscriptError::SaveFailed(format!("{}: {}", path.display(), e)))
    }
}
