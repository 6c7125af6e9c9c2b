//! CLI console utilities

use colored::*;
use gauge_eval::{ConsolidatedReport, EvalStatus, RunProgress, SuiteReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// CLI console for formatted output
pub struct CliConsole {
    verbose: bool,
}

impl CliConsole {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Print an info message (verbose only)
    pub fn info(&self, message: &str) {
        if self.verbose {
            println!("{} {}", "ℹ".blue().bold(), message);
        }
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message.green());
    }

    pub fn warn(&self, message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message.yellow());
    }

    pub fn print_header(&self, title: &str) {
        println!();
        println!("{}", title.bold().underline());
        println!("{}", "=".repeat(title.len()).dimmed());
    }

    /// One colored line per suite after the summary table
    pub fn print_outcomes(&self, report: &ConsolidatedReport) {
        for (name, entry) in report.benchmarks.iter() {
            match entry {
                SuiteReport::Metrics(metrics) => {
                    let status = metrics.status.as_str();
                    let status = match metrics.status {
                        EvalStatus::Completed => status.green().bold(),
                        EvalStatus::Skipped | EvalStatus::NoResults => status.yellow().bold(),
                        EvalStatus::Failed | EvalStatus::Error => status.red().bold(),
                    };
                    match metrics.pass_at_1 {
                        Some(pass) => println!("  {} {} pass@1 {:.1}%", name.bold(), status, pass * 100.0),
                        None => println!("  {} {}", name.bold(), status),
                    }
                }
                SuiteReport::Error { error } => {
                    println!("  {} {} {}", name.bold(), "error".red().bold(), error.dimmed());
                }
            }
        }
    }
}

/// Renders runner progress as one bar per suite
pub struct ProgressReporter {
    current: Mutex<Option<(String, ProgressBar)>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    pub fn update(&self, progress: RunProgress) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };

        let needs_new = !matches!(&*current, Some((suite, _)) if *suite == progress.suite);
        if needs_new {
            if let Some((_, bar)) = current.take() {
                bar.finish();
            }
            let bar = ProgressBar::new(progress.total as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            bar.set_prefix(progress.suite.clone());
            *current = Some((progress.suite.clone(), bar));
        }

        if let Some((_, bar)) = current.as_ref() {
            bar.set_position(progress.completed as u64);
            let marker = if progress.success {
                progress.instance_id.normal()
            } else {
                progress.instance_id.red()
            };
            bar.set_message(marker.to_string());
        }
    }

    /// Finish the active bar, if any
    pub fn finish(&self) {
        if let Ok(mut current) = self.current.lock() {
            if let Some((_, bar)) = current.take() {
                bar.finish_with_message("done");
            }
        }
    }
}
