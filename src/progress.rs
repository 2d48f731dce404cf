//! Progress indicators for the dashsync CLI.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use reconcile::{Error, ProgressCallback};
use std::time::Duration;

/// Create a spinner with a message
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Finish a spinner with a success mark
pub fn finish_success(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    println!("{} {}", "✓".green(), msg);
}

/// Finish a spinner with an error mark
pub fn finish_error(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    eprintln!("{} {}", "✗".red(), msg);
}

/// Progress bar for bulk push/delete runs.
///
/// Failures are printed above the bar as they happen.
pub struct BarProgress {
    pb: ProgressBar,
}

impl BarProgress {
    pub fn new(quiet: bool) -> Self {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self { pb }
    }
}

impl ProgressCallback for BarProgress {
    fn on_batch_start(&self, label: &str, count: usize) {
        self.pb.set_prefix(label.to_string());
        self.pb.set_length(count as u64);
        self.pb.set_position(0);
    }

    fn on_item_complete(&self, id: &str, error: Option<&Error>) {
        if let Some(e) = error {
            self.pb.suspend(|| eprintln!("  {} {id} ({e})", "✗".red()));
        }
        self.pb.set_message(id.to_string());
        self.pb.inc(1);
    }

    fn on_batch_complete(&self) {
        self.pb.finish_and_clear();
    }
}
