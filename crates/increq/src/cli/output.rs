//! Output formatting utilities shared by every subcommand.

use anyhow::{Context, Result};
use colored::*;
use increq_diagnostics::{Diagnostic, Severity};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Output format options for the serialized specification a subcommand
/// produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    JsonPretty,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::JsonPretty,
        }
    }
}

/// Set up color output based on user preference (`auto`, `always`, `never`).
pub fn setup_colors(mode: &str) {
    match mode.to_lowercase().as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => colored::control::set_override(std::env::var("TERM").is_ok()),
    }
}

pub fn format_error(error: &anyhow::Error) -> String {
    format!("{} {}", "Error:".red().bold(), error)
}

pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// Renders one driver diagnostic the way `format_error`/`format_success`
/// render an overall outcome: severity-colored prefix, error code, message.
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let prefix = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Info => "info".cyan().bold(),
    };
    let mut line = format!("{prefix} [{}]: {}", diagnostic.code, diagnostic.message);
    if let Some(location) = &diagnostic.location {
        line.push_str(&format!(" at {location}"));
    }
    line
}

/// Write `content` to a file, or stdout if none is given.
pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        let mut file = File::create(path).with_context(|| format!("failed to create output file: {}", path.display()))?;
        file.write_all(content.as_bytes()).with_context(|| format!("failed to write output file: {}", path.display()))?;
        eprintln!("{}", format_success(&format!("wrote {}", path.display())));
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Serializes `value` in the requested format and writes it via
/// [`write_output`].
pub fn print_value<T: Serialize>(value: &T, format: OutputFormat, output_file: Option<&Path>) -> Result<()> {
    let content = match format {
        OutputFormat::Json => serde_json::to_string(value).context("failed to serialize output")?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value).context("failed to serialize output")?,
    };
    write_output(&content, output_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[derive(Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn print_value_writes_pretty_json_to_the_given_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        print_value(&Point { x: 1, y: 2 }, OutputFormat::JsonPretty, Some(&path)).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, serde_json::to_string_pretty(&Point { x: 1, y: 2 }).unwrap());
    }

    #[test]
    fn output_format_defaults_to_pretty_for_unknown_strings() {
        assert_eq!(OutputFormat::from_str("yaml"), OutputFormat::JsonPretty);
        assert_eq!(OutputFormat::from_str("json"), OutputFormat::Json);
    }
}
