//! Scan transcripts.
//!
//! A transcript is rebuilt purely from a session's event stream: the ordered
//! `(port, status)` list, start and stop times, and whether the scan ran to
//! the end or was stopped. Transcripts render as plain text, JSON or CSV and
//! can be kept in a JSON store under the data directory.

mod format;
mod record;
mod store;

pub use format::TranscriptFormat;
pub use record::{Transcript, TranscriptEntry, TranscriptSink};
pub use store::TranscriptStore;
