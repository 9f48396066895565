//! Output formatting and styling module.
//!
//! All user-facing terminal output of the command-line shell goes through
//! here: colored status lines, the progress bar and summary tables.
//! Diagnostics go through `tracing` instead.

use crate::progress::{CancelFlag, ProgressSink};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Resolution of the progress bar; fractions are mapped onto `0..=STEPS`.
const STEPS: u64 = 100;

/// Prints CLI messages with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use filesort::output::OutputFormatter;
    /// OutputFormatter::success("Files organized successfully!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a percentage progress bar.
    pub fn create_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(STEPS);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints a table of file counts per destination folder.
    ///
    /// ```no_run
    /// use filesort::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("pdf".to_string(), 15);
    /// counts.insert("jpg".to_string(), 8);
    /// OutputFormatter::summary_table(&counts, 23);
    /// ```
    pub fn summary_table(folder_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let width = folder_counts
            .keys()
            .map(|name| name.chars().count())
            .max()
            .unwrap_or(0)
            .max(6);

        println!("{:<width$} | {}", "Folder".bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));

        for (folder, count) in folder_counts {
            println!(
                "{:<width$} | {} {}",
                folder,
                count.to_string().green(),
                file_word(*count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            file_word(total_files),
            width = width
        );
    }
}

fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

/// A [`ProgressSink`] drawing an `indicatif` progress bar.
///
/// Cancellation is read from a [`CancelFlag`] the caller can hand to a
/// signal handler or another thread.
pub struct ProgressBarSink {
    bar: ProgressBar,
    cancel: CancelFlag,
}

impl ProgressBarSink {
    pub fn new(cancel: CancelFlag) -> Self {
        Self {
            bar: OutputFormatter::create_progress_bar(),
            cancel,
        }
    }

    /// Wraps an existing bar, e.g. a hidden one.
    pub fn with_bar(bar: ProgressBar, cancel: CancelFlag) -> Self {
        Self { bar, cancel }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self, message: &'static str) {
        self.bar.finish_with_message(message);
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }

    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for ProgressBarSink {
    fn report(&mut self, fraction: f64) {
        let position = (fraction.clamp(0.0, 1.0) * STEPS as f64).round() as u64;
        self.bar.set_position(position);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_sink_maps_fraction_to_percent() {
        let mut sink = ProgressBarSink::with_bar(ProgressBar::hidden(), CancelFlag::new());
        sink.report(0.25);
        assert_eq!(sink.position(), 25);
        sink.report(1.0);
        assert_eq!(sink.position(), 100);
        sink.report(3.0);
        assert_eq!(sink.position(), 100);
    }

    #[test]
    fn test_progress_bar_sink_follows_cancel_flag() {
        let flag = CancelFlag::new();
        let sink = ProgressBarSink::with_bar(ProgressBar::hidden(), flag.clone());
        assert!(!sink.is_cancelled());
        flag.cancel();
        assert!(sink.is_cancelled());
    }

    #[test]
    fn test_file_word() {
        assert_eq!(file_word(1), "file");
        assert_eq!(file_word(0), "files");
        assert_eq!(file_word(7), "files");
    }
}
