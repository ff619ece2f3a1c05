//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module and returns the process
//! exit code.

pub mod cluster;
pub mod describe;
pub mod init;

use console::style;
use std::process::ExitCode;

use crate::error::ClusterError;
use crate::io::Envelope;

/// Whether styled output should be emitted. Honours `NO_COLOR`.
pub(crate) fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none() && console::colors_enabled()
}

pub(crate) fn heading(text: &str) -> String {
    if colors_enabled() {
        style(text).cyan().bold().to_string()
    } else {
        text.to_string()
    }
}

pub(crate) fn dim(text: &str) -> String {
    if colors_enabled() {
        style(text).dim().to_string()
    } else {
        text.to_string()
    }
}

/// Print a pipeline error with its recovery suggestions.
pub(crate) fn report_error(error: &ClusterError, json: bool) -> ExitCode {
    tracing::debug!(target: "cli", "command failed: {}", error.status_code());

    if json {
        match Envelope::<()>::from_error(error).to_json() {
            Ok(out) => println!("{out}"),
            Err(e) => eprintln!("Error: {error} (and failed to render JSON: {e})"),
        }
    } else {
        eprintln!("Error: {error}");
        let suggestions = error.recovery_suggestions();
        if !suggestions.is_empty() {
            eprintln!();
            eprintln!("Suggestions:");
            for suggestion in suggestions {
                eprintln!("  - {suggestion}");
            }
        }
    }
    ExitCode::FAILURE
}
