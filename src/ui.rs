//! Terminal output. Status lines go to stdout, problems to stderr.

use colored::Colorize;

pub fn info(msg: &str) {
    println!("{} {msg}", "ℹ".blue());
}

pub fn success(msg: &str) {
    println!("{} {msg}", "✓".green());
}

pub fn warn(msg: &str) {
    eprintln!("{} {msg}", "⚠".yellow());
}

pub fn error(msg: &str) {
    eprintln!("{} {msg}", "✗".red());
}

/// Indented secondary line
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Bold title with an underline of the same width
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

pub fn kv(key: &str, value: &str) {
    println!("  {}: {value}", key.dimmed());
}

/// Prefix for messages about work that was only simulated
pub fn dry_run_label(dry_run: bool) -> String {
    if dry_run {
        format!("{} ", "[dry-run]".cyan())
    } else {
        String::new()
    }
}
