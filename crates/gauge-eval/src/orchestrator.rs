//! Runs every enabled suite and assembles the consolidated report

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use gauge_core::{HttpInferenceClient, InferenceBackend, RunConfig, SuiteConfig};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::{BenchError, BenchResult};
use crate::metrics::EvalStatus;
use crate::prompts::PromptStrategy;
use crate::report::{ConsolidatedReport, REPORT_FILE, SuiteReport};
use crate::runner::{BenchmarkRunner, CANCELLED_REASON, ProgressCallback};
use crate::tasks::{DatasetLoader, FileDataset};

/// Runs suites one after another, isolating failures per suite
pub struct Orchestrator {
    config: RunConfig,
    backend: Arc<dyn InferenceBackend>,
    dataset: Arc<dyn DatasetLoader>,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        config: RunConfig,
        backend: Arc<dyn InferenceBackend>,
        dataset: Arc<dyn DatasetLoader>,
    ) -> Self {
        Self {
            config,
            backend,
            dataset,
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Production wiring: HTTP client for the configured endpoint, local
    /// dataset files
    pub fn from_config(config: RunConfig) -> BenchResult<Self> {
        let client = HttpInferenceClient::new(config.model.clone())?;
        Ok(Self::new(config, Arc::new(client), Arc::new(FileDataset)))
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn report_path(&self) -> PathBuf {
        self.config.output_dir.join(REPORT_FILE)
    }

    /// Check the configuration before any suite runs
    pub fn validate(&self) -> BenchResult<()> {
        self.config.validate()?;
        for suite in self.config.enabled_suites() {
            suite
                .prompt_strategy
                .parse::<PromptStrategy>()
                .map_err(|e| BenchError::Config(format!("suite '{}': {}", suite.name, e)))?;
        }
        Ok(())
    }

    /// Run every enabled suite in declaration order
    ///
    /// Only invalid configuration is an error. A suite that fails or panics
    /// is recorded as `{"error": ...}` and the remaining suites still run.
    #[instrument(skip(self), fields(model = %self.config.model.name))]
    pub async fn run(&self) -> BenchResult<ConsolidatedReport> {
        self.validate()?;

        let suites: Vec<&SuiteConfig> = self.config.enabled_suites().collect();
        info!(suites = suites.len(), "starting benchmark run");

        let mut report = ConsolidatedReport::new(&self.config.model.name);

        for suite in suites {
            if self.cancel.is_cancelled() {
                warn!(suite = %suite.name, "run cancelled, not starting suite");
                break;
            }

            info!(suite = %suite.name, "running suite");
            let entry = self.run_suite(suite).await;
            match &entry {
                SuiteReport::Metrics(metrics) => {
                    info!(suite = %suite.name, status = metrics.status.as_str(), "suite complete")
                }
                SuiteReport::Error { error } => {
                    error!(suite = %suite.name, error = %error, "suite failed")
                }
            }

            let cancelled = matches!(
                entry.metrics(),
                Some(m) if m.status == EvalStatus::Failed && m.reason.as_deref() == Some(CANCELLED_REASON)
            );
            report.benchmarks.insert(suite.name.clone(), entry);
            if cancelled {
                break;
            }
        }

        report.timestamp = Utc::now();

        if self.config.generate_report {
            let path = self.report_path();
            match report.write(&path).await {
                Ok(()) => info!(path = %path.display(), "report written"),
                Err(e) => error!(path = %path.display(), error = %e, "failed to write report"),
            }
        }

        Ok(report)
    }

    /// Run one suite on its own task so a panic cannot escape
    async fn run_suite(&self, suite: &SuiteConfig) -> SuiteReport {
        let suite = suite.clone();
        let backend = self.backend.clone();
        let dataset = self.dataset.clone();
        let progress = self.progress.clone();
        let cancel = self.cancel.clone();
        let dir = self.config.suite_dir(&suite.name);

        let handle = tokio::spawn(async move {
            let mut runner =
                BenchmarkRunner::new(suite, backend, dataset, dir)?.with_cancellation(cancel);
            if let Some(callback) = progress {
                runner = runner.with_progress(callback);
            }
            runner.run().await
        });

        match handle.await {
            Ok(Ok(metrics)) => SuiteReport::Metrics(metrics),
            Ok(Err(e)) => SuiteReport::error(e.to_string()),
            Err(e) => SuiteReport::error(join_error_message(e)),
        }
    }
}

fn join_error_message(error: JoinError) -> String {
    if error.is_panic() {
        format!("suite panicked: {}", panic_message(error.into_panic()))
    } else {
        format!("suite task aborted: {}", error)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
