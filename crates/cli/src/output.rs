//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Placeholder for absent values
pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Format a price in euros
pub fn format_price(amount: Option<f64>) -> String {
    match amount {
        Some(amount) => format!("€{:.2}", amount),
        None => "-".to_string(),
    }
}

/// Format a discount ratio (0.1 = 10 %)
pub fn format_discount(ratio: Option<f64>) -> String {
    match ratio {
        Some(ratio) => format!("{:.0}%", ratio * 100.0),
        None => "-".to_string(),
    }
}

/// Rating as stars out of five, rounded to the nearest whole star
pub fn format_rating(rating: Option<f64>) -> String {
    match rating {
        Some(rating) if rating.is_finite() => {
            let filled = rating.round().clamp(0.0, 5.0) as usize;
            format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
        }
        _ => "-".to_string(),
    }
}

/// Color a yes/no flag
pub fn color_flag(value: bool) -> String {
    if value {
        "yes".green().to_string()
    } else {
        "no".red().to_string()
    }
}
