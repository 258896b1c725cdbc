//! Structured logging using **tracing**.
//!
//! The core only emits events; installing a subscriber is left to the
//! binary. Per-branch failures that resolution swallows are logged at
//! `debug`, skipped files at `warn`, request summaries at `info`.

use std::fmt::Display;
use std::path::Path;
use tracing::{error, info, warn};

/// Initializes the global tracing collector (subscriber).
///
/// This should be called *once* at the beginning of the application's runtime.
/// It configures structured JSON output to stderr.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=sqlmark_core=debug`)
pub fn init_structured_logging() {
    tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr) // stdout stays clean for reports
        .init();
}

/// Logs a warning event.
pub fn log_warn(message: &str) {
    warn!(detail = %message);
}

/// Logs an info event.
pub fn log_info(message: &str) {
    info!(detail = %message);
}

/// Logs an error event.
pub fn log_error(message: &str) {
    error!(detail = %message);
}

/// Logs an input file that analysis continues without.
pub fn log_skipped(path: &Path, reason: &dyn Display) {
    warn!(path = %path.display(), reason = %reason, "skipping file");
}

/// Logs a custom event, mapping the event name to a level.
pub fn log_event(event: &str, detail: &str) {
    match event.to_uppercase().as_str() {
        "ERROR" => error!(event = %event, detail = %detail),
        "WARN" | "WARNING" => warn!(event = %event, detail = %detail),
        _ => info!(event = %event, detail = %detail),
    }
}
