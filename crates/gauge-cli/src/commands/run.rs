//! `gauge run`: execute benchmark suites

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use gauge_core::config::{apply_env_overrides, load_from_file};
use gauge_core::{RunConfig, init_logging};
use gauge_eval::{Orchestrator, generate_table};
use tokio_util::sync::CancellationToken;

use crate::args::RunArgs;
use crate::console::{CliConsole, ProgressReporter};

pub async fn execute(args: RunArgs, verbose: bool) -> Result<()> {
    let console = CliConsole::new(verbose);

    let mut config = load_from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    console.info(&format!("Loaded config from {}", args.config.display()));
    apply_env_overrides(&mut config);
    apply_cli_overrides(&mut config, &args)?;
    if verbose {
        config.logging.level = "debug".to_string();
    }

    init_logging(&config.logging)?;

    let orchestrator = Orchestrator::from_config(config)?;
    orchestrator.validate()?;

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    let reporter = Arc::new(ProgressReporter::new());
    let progress = reporter.clone();
    let orchestrator = orchestrator
        .with_cancellation(cancel.clone())
        .with_progress(Arc::new(move |update| progress.update(update)));

    let enabled: Vec<String> = orchestrator
        .config()
        .enabled_suites()
        .map(|s| s.name.clone())
        .collect();
    console.print_header(&format!(
        "Benchmarking {} on {}",
        orchestrator.config().model.name,
        enabled.join(", ")
    ));

    let report = orchestrator.run().await?;
    reporter.finish();

    println!("{}", generate_table(&report));
    console.print_outcomes(&report);

    if orchestrator.config().generate_report {
        console.success(&format!(
            "Report written to {}",
            orchestrator.report_path().display()
        ));
    }
    if cancel.is_cancelled() {
        console.warn("Run interrupted; re-run the same command to resume.");
    }

    Ok(())
}

/// Apply command-line overrides on top of file and environment settings
pub fn apply_cli_overrides(config: &mut RunConfig, args: &RunArgs) -> Result<()> {
    if let Some(name) = &args.model_name {
        config.model.name = name.clone();
    }
    if let Some(url) = &args.api_url {
        config.model.base_url = url.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }

    if !args.suites.is_empty() {
        for wanted in &args.suites {
            if !config.suites.iter().any(|s| &s.name == wanted) {
                let known: Vec<&str> = config.suites.iter().map(|s| s.name.as_str()).collect();
                bail!("Unknown suite '{}'. Configured: {}", wanted, known.join(", "));
            }
        }
        for suite in &mut config.suites {
            suite.enabled = args.suites.contains(&suite.name);
        }
    }

    for suite in config.suites.iter_mut().filter(|s| s.enabled) {
        if let Some(limit) = args.instances {
            suite.instance_limit = Some(limit);
        }
        if let Some(parallel) = args.parallel {
            suite.concurrency_limit = parallel;
        }
        if let Some(strategy) = &args.prompt_strategy {
            suite.prompt_strategy = strategy.clone();
        }
        if args.no_evaluate {
            suite.auto_evaluate = false;
        }
    }

    Ok(())
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupt received, finishing in-flight requests...");
            tracing::warn!("interrupt received, cancelling run");
            cancel.cancel();
        }
    });
}
