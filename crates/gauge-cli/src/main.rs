//! Gauge CLI
//!
//! Runs benchmark suites against an OpenAI-compatible model endpoint and
//! scores the results with an external evaluation harness.
//!
//! ```bash
//! gauge run --config gauge.toml --suite swebench_lite --instances 10
//! gauge convert outputs/swebench_lite/predictions.jsonl preds.jsonl
//! gauge strategies
//! gauge report outputs/consolidated_report.json
//! ```

mod args;
mod commands;
mod console;

use anyhow::Result;
use clap::Parser;
use gauge_core::LoggingConfig;
use gauge_core::config::load_dotenv;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::execute(args, cli.verbose).await,
        Commands::Convert { input, output } => {
            init_default_logging(cli.verbose)?;
            commands::convert(&input, &output).await
        }
        Commands::Strategies => commands::strategies(),
        Commands::Report { path } => commands::report(&path).await,
    }
}

fn init_default_logging(verbose: bool) -> Result<()> {
    let mut logging = LoggingConfig::default();
    if verbose {
        logging.level = "debug".to_string();
    }
    gauge_core::init_logging(&logging)?;
    Ok(())
}
