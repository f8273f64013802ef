//! Configuration management for Maltus.
//!
//! Provides XDG-compliant configuration storage and the application
//! settings that seed scan defaults.

mod settings;

pub use settings::{AppSettings, Paths};
