//! Console output.
//!
//! Streams a session's results to the terminal as they are released and
//! prints the surrounding header, summary and status messages.

mod plain;

pub use plain::{
    print_error, print_info, print_scan_header, print_success, print_summary, print_warning,
    ConsoleSink,
};
