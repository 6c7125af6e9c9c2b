//! External evaluation harness
//!
//! Runs the scoring process as a subprocess under a wall-clock timeout and
//! folds its `results.json` into [`EvaluationMetrics`]. Every outcome,
//! including a missing binary, is returned as metrics rather than an error.

mod results;

pub use results::parse_counts;

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use gauge_core::HarnessConfig;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::metrics::EvaluationMetrics;

/// File the harness is expected to write into its output directory
pub const RESULTS_FILE: &str = "results.json";

const MAX_STDERR_CHARS: usize = 4000;

/// Invokes the configured harness command
#[derive(Debug, Clone)]
pub struct HarnessAdapter {
    config: HarnessConfig,
}

impl HarnessAdapter {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Score `predictions_path`, writing harness output under `output_dir`
    #[instrument(skip(self, predictions_path, output_dir), fields(suite = %suite_name))]
    pub async fn evaluate(
        &self,
        predictions_path: &Path,
        suite_name: &str,
        output_dir: &Path,
    ) -> EvaluationMetrics {
        let Some((program, leading_args)) = self.config.command.split_first() else {
            return EvaluationMetrics::error("harness command is empty");
        };

        if let Err(e) = tokio::fs::create_dir_all(output_dir).await {
            return EvaluationMetrics::error(format!(
                "failed to create harness output dir {}: {}",
                output_dir.display(),
                e
            ));
        }

        // Only a results file written by this invocation counts.
        let results_path = output_dir.join(RESULTS_FILE);
        match tokio::fs::remove_file(&results_path).await {
            Ok(()) => debug!(path = %results_path.display(), "removed stale results file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return EvaluationMetrics::error(format!(
                    "failed to remove stale {}: {}",
                    results_path.display(),
                    e
                ));
            }
        }

        let mut cmd = Command::new(program);
        cmd.args(leading_args)
            .arg("--predictions_path")
            .arg(predictions_path)
            .arg("--dataset_name")
            .arg(&self.config.dataset_name)
            .arg("--output_dir")
            .arg(output_dir)
            .args(&self.config.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(
            program = %program,
            predictions = %predictions_path.display(),
            timeout_secs = self.config.timeout_secs,
            "running evaluation harness"
        );

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(program = %program, "harness not installed, skipping evaluation");
                return EvaluationMetrics::skipped(format!("harness not installed: {}", program));
            }
            Err(e) => {
                return EvaluationMetrics::error(format!(
                    "failed to start harness {}: {}",
                    program, e
                ));
            }
        };

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match timeout(self.config.timeout(), child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return EvaluationMetrics::error(format!("failed waiting for harness: {}", e));
            }
            Err(_) => {
                warn!(timeout_secs = self.config.timeout_secs, "harness timed out, killed");
                return EvaluationMetrics::failed(format!(
                    "harness timed out after {}s",
                    self.config.timeout_secs
                ));
            }
        };

        if !output.status.success() {
            let stderr = tail(&String::from_utf8_lossy(&output.stderr), MAX_STDERR_CHARS);
            warn!(status = %output.status, "harness exited with failure");
            return EvaluationMetrics::failed(format!("harness exited with {}", output.status))
                .with_error(stderr);
        }

        let submitted = count_predictions(predictions_path).await;
        read_results(&results_path, submitted).await
    }
}

/// Turn the results file into metrics
async fn read_results(path: &Path, submitted: u64) -> EvaluationMetrics {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "harness wrote no results file");
            return EvaluationMetrics::no_results();
        }
        Err(e) => {
            return EvaluationMetrics::error(format!("failed to read {}: {}", path.display(), e));
        }
    };

    let parsed = serde_json::from_str(&content)
        .map_err(|e| e.to_string())
        .and_then(|data| parse_counts(&data, submitted));

    match parsed {
        Ok((resolved, total)) => {
            info!(resolved, total, "evaluation completed");
            EvaluationMetrics::completed(resolved, total)
        }
        Err(e) => EvaluationMetrics::error(format!("unreadable {}: {}", path.display(), e)),
    }
}

async fn count_predictions(path: &Path) -> u64 {
    match tokio::fs::read(path).await {
        Ok(content) => content
            .split(|b| *b == b'\n')
            .filter(|l| !l.trim_ascii().is_empty())
            .count() as u64,
        Err(_) => 0,
    }
}

/// Last `max_chars` characters of `text`, trimmed
fn tail(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= max_chars {
        return trimmed.to_string();
    }
    let tail: String = trimmed.chars().skip(count - max_chars).collect();
    format!("...{}", tail)
}
