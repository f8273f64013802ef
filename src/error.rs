//! Error types for Maltus.
//!
//! Uses `thiserror` for ergonomic error definitions.

use crate::types::{PortError, SessionIdError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by scan session lifecycle transitions.
///
/// Only pre-start failures are fatal to a session; per-port probe failures
/// travel through the event stream as `ProbeStatus::Error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid port range {start}-{end}: ports must satisfy 1 <= start <= end <= 65535")]
    InvalidRange { start: u32, end: u32 },

    #[error("could not resolve target '{0}'")]
    UnresolvedTarget(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("session has already been started")]
    AlreadyStarted,

    #[error("no tokio runtime available to drive the scan")]
    NoRuntime,
}

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised while loading or saving settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine a configuration directory for this platform")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid settings file: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while persisting scan transcripts.
#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("failed to save transcript: {0}")]
    SaveFailed(String),

    #[error("failed to load transcript: {0}")]
    LoadFailed(String),

    #[error("transcript not found: {0}")]
    NotFound(String),

    #[error("transcript storage directory error: {0}")]
    DirectoryError(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for transcript operations.
pub type TranscriptResult<T> = Result<T, TranscriptError>;

/// Top-level error for the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    SessionId(#[from] SessionIdError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
