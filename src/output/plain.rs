//! Plain text console output.
//!
//! Produces human-readable output with colors and formatting.

use crate::scanner::{ProbeResult, ProbeStatus};
use crate::session::{EventSink, ScanEvent, ScanSummary};
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const RULE: &str = "═══════════════════════════════════════════════════════════════";

/// Event sink that prints results live, in port order, under a progress bar.
pub struct ConsoleSink {
    progress: ProgressBar,
    show_closed: bool,
}

impl ConsoleSink {
    /// Create a console sink for a range of `total` ports.
    ///
    /// With `show_progress` off the bar is hidden and only result lines print.
    pub fn new(total: usize, show_closed: bool, show_progress: bool) -> Self {
        let progress = if show_progress {
            let pb = ProgressBar::new(total as u64);
            if let Ok(bar_style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            ) {
                pb.set_style(bar_style.progress_chars("=>-"));
            }
            pb
        } else {
            ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden())
        };

        Self {
            progress,
            show_closed,
        }
    }

    fn print_result(&self, result: &ProbeResult) {
        let line = match &result.status {
            ProbeStatus::Open => {
                self.progress
                    .set_message(format!("Found open port: {}", result.port));
                format!(
                    "Port {:>5} : {}",
                    result.port,
                    style("OPEN").green().bold()
                )
            }
            ProbeStatus::Closed if !self.show_closed => return,
            ProbeStatus::Closed => format!("Port {:>5} : {}", result.port, style("closed").red()),
            ProbeStatus::Error(reason) => format!(
                "Port {:>5} : {} {}",
                result.port,
                style("error").yellow(),
                style(format!("({})", reason)).dim()
            ),
        };

        if self.progress.is_hidden() {
            println!("{}", line);
        } else {
            self.progress.println(line);
        }
    }
}

impl EventSink for ConsoleSink {
    fn handle(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::Result(result) => self.print_result(result),
            ScanEvent::Progress(progress) => self.progress.set_position(progress.emitted as u64),
            ScanEvent::Finished(summary) => {
                if summary.was_stopped {
                    self.progress.abandon_with_message("Scan stopped");
                } else {
                    self.progress.finish_with_message("Scan complete");
                }
            }
        }
    }
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(target: &str, ip: &str, range: &str, ports: usize) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("Maltus").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Target: {} ({})",
        style("•").dim(),
        style(target).white().bold(),
        ip
    );
    println!(
        "{} Scanning {} ports ({})...",
        style("•").dim(),
        style(ports).white().bold(),
        range
    );
    println!();
}

/// Print the terminal summary of a session.
pub fn print_summary(summary: &ScanSummary) {
    println!();
    println!("{}", style(RULE).cyan());
    println!(
        "  {} {} of {} ports scanned in {:.2}s",
        style("Statistics:").bold(),
        summary.emitted,
        summary.total,
        summary.duration_ms as f64 / 1000.0
    );
    println!(
        "               {} open, {} closed, {} errors",
        style(summary.open).green().bold(),
        style(summary.closed).red(),
        style(summary.errors).yellow()
    );
    if summary.was_stopped {
        println!("  {}", style("[!] Scan stopped by user.").red());
    }
    println!(
        "  {} {}",
        style("Session:").bold(),
        style(summary.session_id.short()).dim()
    );
    println!("{}", style(RULE).cyan());
    println!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}
