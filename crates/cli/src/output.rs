//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a value as pretty JSON
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Format a utilization ratio as a percentage
pub fn format_ratio(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Color a utilization ratio against the default scoring thresholds
pub fn color_ratio(ratio: f64) -> String {
    let formatted = format_ratio(ratio);
    if ratio >= scorer_lib::engine::DEFAULT_THETA2 {
        formatted.red().to_string()
    } else if ratio >= scorer_lib::engine::DEFAULT_THETA1 {
        formatted.yellow().to_string()
    } else {
        formatted.green().to_string()
    }
}

/// Color a node score
pub fn color_score(score: i64) -> String {
    if score >= 50 {
        score.to_string().green().to_string()
    } else if score > 0 {
        score.to_string().yellow().to_string()
    } else {
        score.to_string().red().to_string()
    }
}
