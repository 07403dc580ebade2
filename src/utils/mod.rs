//! Utilities module for logging and error handling

pub mod error;
pub mod logging;

pub use error::{DiagnosisError, Result};
pub use logging::{init_logging, LogConfig, LogLevel};

/// Format a duration in milliseconds in a human-readable way
pub fn format_millis(ms: f64) -> String {
    if ms < 1.0 {
        format!("{:.0}µs", ms * 1000.0)
    } else if ms < 1000.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{:.2}s", ms / 1000.0)
    }
}
