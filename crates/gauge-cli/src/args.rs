//! CLI argument definitions using clap
//!
//! - gauge run --config gauge.toml     # Run every enabled suite
//! - gauge convert <in> <out>          # Store → harness predictions
//! - gauge strategies                  # List prompt strategies
//! - gauge report <report.json>        # Re-print a run summary

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "gauge.toml";

#[derive(Parser, Debug)]
#[command(name = "gauge")]
#[command(about = "Gauge - benchmark execution engine for language models")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run benchmark suites against a model endpoint
    Run(RunArgs),

    /// Convert a result store into harness prediction format
    Convert {
        /// Result store (predictions.jsonl)
        input: PathBuf,
        /// Harness predictions file to write
        output: PathBuf,
    },

    /// List available prompt strategies
    Strategies,

    /// Print the summary table of a consolidated report
    Report {
        /// Path to consolidated_report.json
        path: PathBuf,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Configuration file (JSON, TOML or YAML)
    #[arg(long, short, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Only run the named suites (repeatable)
    #[arg(long = "suite", value_name = "NAME")]
    pub suites: Vec<String>,

    /// Override the model name
    #[arg(long)]
    pub model_name: Option<String>,

    /// Override the endpoint base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Cap the number of instances per suite
    #[arg(long)]
    pub instances: Option<usize>,

    /// Concurrent generations per suite
    #[arg(long)]
    pub parallel: Option<usize>,

    /// Prompt strategy for every selected suite
    #[arg(long)]
    pub prompt_strategy: Option<String>,

    /// Output directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Skip harness evaluation
    #[arg(long)]
    pub no_evaluate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_flags_parse() {
        let cli = Cli::parse_from([
            "gauge",
            "run",
            "--config",
            "bench.yaml",
            "--suite",
            "lite",
            "--suite",
            "verified",
            "--instances",
            "5",
            "--parallel",
            "8",
            "--no-evaluate",
            "-v",
        ]);

        assert!(cli.verbose);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.config, PathBuf::from("bench.yaml"));
        assert_eq!(args.suites, vec!["lite", "verified"]);
        assert_eq!(args.instances, Some(5));
        assert_eq!(args.parallel, Some(8));
        assert!(args.no_evaluate);
    }

    #[test]
    fn test_convert_positional_args() {
        let cli = Cli::parse_from(["gauge", "convert", "in.jsonl", "out.jsonl"]);
        assert!(matches!(cli.command, Commands::Convert { .. }));
    }
}
