//! Subcommand handlers

pub mod run;

use std::path::Path;

use anyhow::{Context, Result};
use colored::*;
use gauge_eval::{ConsolidatedReport, PromptStrategy, convert_predictions, generate_table};

use crate::console::CliConsole;

/// `gauge convert`
pub async fn convert(input: &Path, output: &Path) -> Result<()> {
    let console = CliConsole::new(false);
    let summary = convert_predictions(input, output)
        .await
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    console.success(&format!(
        "Converted {} predictions ({} skipped)",
        summary.converted, summary.skipped
    ));
    println!("Output: {}", output.display());
    Ok(())
}

/// `gauge strategies`
pub fn strategies() -> Result<()> {
    println!("{}", "Prompt strategies".bold().underline());
    for strategy in PromptStrategy::ALL {
        let marker = if strategy == PromptStrategy::default() {
            " (default)".dimmed().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<18} {}{}",
            strategy.name().cyan(),
            strategy.description(),
            marker
        );
    }
    Ok(())
}

/// `gauge report`
pub async fn report(path: &Path) -> Result<()> {
    let report = ConsolidatedReport::load(path)
        .await
        .with_context(|| format!("Failed to load report {}", path.display()))?;
    println!("{}", generate_table(&report));
    CliConsole::new(false).print_outcomes(&report);
    Ok(())
}
