//! Per-suite benchmark runner
//!
//! A run moves through `Loading → Generating → Persisting → Evaluating →
//! Done`, or ends in `Failed`. Generation uses a fixed pool of
//! `concurrency_limit` workers pulling instances from a shared queue; each
//! result goes to the [`ResultStore`] as soon as it exists, so an interrupted
//! run resumes from where it stopped.

mod progress;

pub use progress::{ProgressCallback, RunProgress, RunStage};

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use gauge_core::{InferenceBackend, SuiteConfig};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::convert::convert_selected;
use crate::error::BenchResult;
use crate::harness::HarnessAdapter;
use crate::metrics::{EvaluationMetrics, GenerationStats};
use crate::prompts::PromptStrategy;
use crate::store::ResultStore;
use crate::tasks::{DatasetLoader, TaskInstance, TaskResult};

/// Result store file inside a suite's output directory
pub const PREDICTIONS_FILE: &str = "predictions.jsonl";
/// Converted predictions handed to the harness
pub const HARNESS_PREDICTIONS_FILE: &str = "predictions_harness.jsonl";
/// Harness output directory inside a suite's output directory
pub const EVALUATION_DIR: &str = "evaluation_results";

/// Reason recorded when a run is interrupted
pub const CANCELLED_REASON: &str = "cancelled";

/// Drives one benchmark suite
pub struct BenchmarkRunner {
    suite: SuiteConfig,
    strategy: PromptStrategy,
    backend: Arc<dyn InferenceBackend>,
    dataset: Arc<dyn DatasetLoader>,
    suite_dir: PathBuf,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
}

/// State shared by the workers of one run
struct GenerationContext<'a> {
    queue: Mutex<VecDeque<TaskInstance>>,
    store: &'a ResultStore,
    buffer: Mutex<Vec<TaskResult>>,
    completed: AtomicUsize,
    total: usize,
    stop: CancellationToken,
}

impl BenchmarkRunner {
    /// Create a runner, resolving the suite's prompt strategy
    ///
    /// Fails with `BenchError::UnknownStrategy` when the name is not in the
    /// registry.
    pub fn new(
        suite: SuiteConfig,
        backend: Arc<dyn InferenceBackend>,
        dataset: Arc<dyn DatasetLoader>,
        suite_dir: impl Into<PathBuf>,
    ) -> BenchResult<Self> {
        let strategy: PromptStrategy = suite.prompt_strategy.parse()?;
        Ok(Self {
            suite,
            strategy,
            backend,
            dataset,
            suite_dir: suite_dir.into(),
            progress: None,
            cancel: CancellationToken::new(),
        })
    }

    /// Report progress after each recorded result
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Stop taking new instances once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn suite(&self) -> &SuiteConfig {
        &self.suite
    }

    pub fn strategy(&self) -> PromptStrategy {
        self.strategy
    }

    pub fn predictions_path(&self) -> PathBuf {
        self.suite_dir.join(PREDICTIONS_FILE)
    }

    pub fn harness_predictions_path(&self) -> PathBuf {
        self.suite_dir.join(HARNESS_PREDICTIONS_FILE)
    }

    pub fn evaluation_dir(&self) -> PathBuf {
        self.suite_dir.join(EVALUATION_DIR)
    }

    /// Run the suite to completion
    ///
    /// Per-instance failures are recorded in the store. An error is returned
    /// only for suite-fatal problems: the dataset or the store.
    #[instrument(skip(self), fields(suite = %self.suite.name, strategy = %self.strategy))]
    pub async fn run(&self) -> BenchResult<EvaluationMetrics> {
        match self.run_stages().await {
            Ok(metrics) => {
                debug!(stage = %RunStage::Done, status = metrics.status.as_str(), "suite finished");
                Ok(metrics)
            }
            Err(e) => {
                warn!(stage = %RunStage::Failed, error = %e, "suite failed");
                Err(e)
            }
        }
    }

    async fn run_stages(&self) -> BenchResult<EvaluationMetrics> {
        debug!(stage = %RunStage::Loading, "loading dataset");
        let instances = self.suite.select(self.dataset.load(&self.suite).await?);
        let selected: HashSet<String> = instances.iter().map(|i| i.instance_id.clone()).collect();

        let store = ResultStore::open(self.predictions_path()).await?;
        let done = store.processed_ids().await;

        let mut queued = HashSet::new();
        let pending: VecDeque<TaskInstance> = instances
            .into_iter()
            .filter(|i| !done.contains(&i.instance_id) && queued.insert(i.instance_id.clone()))
            .collect();
        let already_done = selected.iter().filter(|id| done.contains(*id)).count();

        info!(
            selected = selected.len(),
            already_done,
            pending = pending.len(),
            concurrency = self.suite.concurrency_limit,
            "starting generation"
        );

        debug!(stage = %RunStage::Generating, "generating");
        let ctx = GenerationContext {
            queue: Mutex::new(pending),
            store: &store,
            buffer: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(already_done),
            total: selected.len(),
            stop: self.cancel.child_token(),
        };
        self.generate(&ctx).await?;

        if !self.suite.incremental_persistence {
            debug!(stage = %RunStage::Persisting, "writing buffered results");
            let buffered = std::mem::take(&mut *ctx.buffer.lock().await);
            let written = store.append_batch(buffered).await?;
            debug!(written, "buffered results persisted");
        }

        let stats = self.generation_stats(&store, &selected).await;
        info!(
            total = stats.total,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "generation finished"
        );

        if self.cancel.is_cancelled() {
            warn!("suite cancelled");
            return Ok(EvaluationMetrics::failed(CANCELLED_REASON).with_generation(stats));
        }

        debug!(stage = %RunStage::Evaluating, "evaluating");
        let metrics = self.evaluate(&store, &selected).await?;
        Ok(metrics.with_generation(stats))
    }

    /// Run the worker pool until the queue drains or the run is stopped
    async fn generate(&self, ctx: &GenerationContext<'_>) -> BenchResult<()> {
        let pending = ctx.queue.lock().await.len();
        if pending == 0 {
            return Ok(());
        }
        let workers = self.suite.concurrency_limit.clamp(1, pending);

        let outcomes = join_all((0..workers).map(|worker_id| self.worker(worker_id, ctx))).await;
        outcomes.into_iter().collect()
    }

    async fn worker(&self, worker_id: usize, ctx: &GenerationContext<'_>) -> BenchResult<()> {
        loop {
            if ctx.stop.is_cancelled() {
                debug!(worker_id, "worker stopping");
                return Ok(());
            }
            let Some(instance) = ctx.queue.lock().await.pop_front() else {
                return Ok(());
            };

            let result = self.process_instance(&instance).await;
            if let Err(e) = self.record(ctx, result).await {
                // Store failures are fatal for the whole suite.
                ctx.stop.cancel();
                return Err(e);
            }
        }
    }

    /// Build the prompt, call the model, and wrap the outcome
    async fn process_instance(&self, instance: &TaskInstance) -> TaskResult {
        let id = &instance.instance_id;
        let prompt = match self.strategy.build_prompt(instance) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(instance_id = %id, error = %e, "could not build prompt");
                return TaskResult::failed(id, e.to_string());
            }
        };

        match self.backend.generate(&prompt).await {
            Ok(generation) => {
                debug!(instance_id = %id, attempts = generation.attempts, "generated");
                let output = self
                    .strategy
                    .build_output(&generation.text, self.backend.model_name());
                TaskResult::succeeded(id, output)
            }
            Err(e) => {
                warn!(instance_id = %id, error = %e, "generation failed");
                TaskResult::failed(id, e.to_string())
            }
        }
    }

    async fn record(&self, ctx: &GenerationContext<'_>, result: TaskResult) -> BenchResult<()> {
        let instance_id = result.instance_id.clone();
        let success = result.success;

        if self.suite.incremental_persistence {
            ctx.store.append(result).await?;
        } else {
            ctx.buffer.lock().await.push(result);
        }

        let completed = ctx.completed.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(callback) = &self.progress {
            callback(RunProgress {
                suite: self.suite.name.clone(),
                completed,
                total: ctx.total,
                instance_id,
                success,
            });
        }
        Ok(())
    }

    /// Counts over the selected instances, read back from the store
    async fn generation_stats(&self, store: &ResultStore, selected: &HashSet<String>) -> GenerationStats {
        let results: Vec<TaskResult> = store
            .results()
            .await
            .into_iter()
            .filter(|r| selected.contains(&r.instance_id))
            .collect();
        GenerationStats::from_results(&results)
    }

    /// Score the selected instances with the suite's harness
    async fn evaluate(
        &self,
        store: &ResultStore,
        selected: &HashSet<String>,
    ) -> BenchResult<EvaluationMetrics> {
        if !self.suite.auto_evaluate {
            info!("auto-evaluation disabled");
            return Ok(EvaluationMetrics::skipped("auto-evaluation disabled"));
        }
        let Some(harness) = &self.suite.harness else {
            info!("no harness configured");
            return Ok(EvaluationMetrics::skipped("no harness configured"));
        };

        let predictions = if harness.convert_predictions {
            let converted = self.harness_predictions_path();
            convert_selected(store.path(), &converted, selected).await?;
            converted
        } else {
            store.path().to_path_buf()
        };

        Ok(HarnessAdapter::new(harness.clone())
            .evaluate(&predictions, &self.suite.name, &self.evaluation_dir())
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use crate::metrics::EvalStatus;
    use crate::testing::{FakeBackend, StaticDataset, patch_instances};
    use gauge_core::{DatasetSource, HarnessConfig};
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    fn suite(concurrency: usize) -> SuiteConfig {
        SuiteConfig::new("lite", DatasetSource::new("unused.jsonl"))
            .with_concurrency(concurrency)
            .with_auto_evaluate(false)
    }

    fn runner(
        suite: SuiteConfig,
        backend: Arc<FakeBackend>,
        instances: Vec<TaskInstance>,
        dir: &TempDir,
    ) -> BenchmarkRunner {
        BenchmarkRunner::new(
            suite,
            backend,
            Arc::new(StaticDataset::new(instances)),
            dir.path().join("lite"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_every_instance_gets_one_result() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FakeBackend::new().fail_on("bad-"));
        let mut instances = patch_instances(10);
        instances.push(
            TaskInstance::new("bad-1")
                .with_field("repo", "a/b")
                .with_field("problem_statement", "bad-1"),
        );

        let runner = runner(suite(3), backend.clone(), instances, &dir);
        let metrics = runner.run().await.unwrap();

        assert_eq!(metrics.status, EvalStatus::Skipped);
        let stats = metrics.generation.unwrap();
        assert_eq!(stats.total, 11);
        assert_eq!(stats.failed, 1);
        assert_eq!(backend.calls(), 11);

        let store = ResultStore::open(runner.predictions_path()).await.unwrap();
        let failed: Vec<_> = store.results().await.into_iter().filter(|r| !r.success).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].instance_id, "bad-1");
        assert!(failed[0].error.as_ref().unwrap().contains("server error"));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FakeBackend::new().with_delay_ms(20));

        runner(suite(4), backend.clone(), patch_instances(20), &dir)
            .run()
            .await
            .unwrap();

        assert_eq!(backend.calls(), 20);
        assert!(backend.max_in_flight() <= 4);
        assert!(backend.max_in_flight() >= 2);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FakeBackend::new());

        let first = runner(suite(2), backend.clone(), patch_instances(5), &dir)
            .run()
            .await
            .unwrap();
        assert_eq!(backend.calls(), 5);

        let second = runner(suite(2), backend.clone(), patch_instances(5), &dir)
            .run()
            .await
            .unwrap();
        assert_eq!(backend.calls(), 5);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_resume_processes_only_missing() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FakeBackend::new());

        runner(suite(2), backend.clone(), patch_instances(3), &dir)
            .run()
            .await
            .unwrap();
        assert_eq!(backend.calls(), 3);

        let metrics = runner(suite(2), backend.clone(), patch_instances(8), &dir)
            .run()
            .await
            .unwrap();
        assert_eq!(backend.calls(), 8);
        assert_eq!(metrics.generation.unwrap().total, 8);
    }

    #[tokio::test]
    async fn test_offset_and_limit_applied() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let suite = suite(2).with_starting_offset(2).with_instance_limit(3);

        let runner = runner(suite, backend.clone(), patch_instances(10), &dir);
        runner.run().await.unwrap();

        let store = ResultStore::open(runner.predictions_path()).await.unwrap();
        let mut ids: Vec<_> = store.processed_ids().await.into_iter().collect();
        ids.sort();
        assert_eq!(ids, vec!["task-2", "task-3", "task-4"]);
    }

    #[tokio::test]
    async fn test_buffered_persistence_writes_after_generation() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let suite = suite(2).with_incremental_persistence(false);

        let runner = runner(suite, backend, patch_instances(4), &dir);
        let metrics = runner.run().await.unwrap();

        assert_eq!(metrics.generation.unwrap().succeeded, 4);
        let content = std::fs::read_to_string(runner.predictions_path()).unwrap();
        assert_eq!(content.lines().count(), 4);
    }

    #[tokio::test]
    async fn test_missing_prompt_field_is_instance_failure() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let mut instances = patch_instances(2);
        instances.push(TaskInstance::new("no-repo").with_field("problem_statement", "x"));

        let metrics = runner(suite(1), backend.clone(), instances, &dir)
            .run()
            .await
            .unwrap();

        let stats = metrics.generation.unwrap();
        assert_eq!((stats.total, stats.failed), (3, 1));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_strategy_rejected_at_construction() {
        let dir = TempDir::new().unwrap();
        let result = BenchmarkRunner::new(
            suite(1).with_prompt_strategy("fancy"),
            Arc::new(FakeBackend::new()),
            Arc::new(StaticDataset::new(Vec::new())),
            dir.path(),
        );
        assert!(matches!(result, Err(BenchError::UnknownStrategy { .. })));
    }

    #[tokio::test]
    async fn test_dataset_failure_is_suite_fatal() {
        let dir = TempDir::new().unwrap();
        let runner = BenchmarkRunner::new(
            suite(1),
            Arc::new(FakeBackend::new()),
            Arc::new(StaticDataset::failing("corrupt dataset")),
            dir.path().join("lite"),
        )
        .unwrap();

        let err = runner.run().await.unwrap_err();
        assert!(err.to_string().contains("corrupt dataset"));
    }

    #[tokio::test]
    async fn test_progress_reports_each_result() {
        let dir = TempDir::new().unwrap();
        let seen = Arc::new(AtomicUsize::new(0));
        let max_completed = Arc::new(AtomicUsize::new(0));
        let (seen_cb, max_cb) = (seen.clone(), max_completed.clone());

        runner(suite(3), Arc::new(FakeBackend::new()), patch_instances(6), &dir)
            .with_progress(Arc::new(move |p: RunProgress| {
                assert_eq!(p.total, 6);
                seen_cb.fetch_add(1, Ordering::SeqCst);
                max_cb.fetch_max(p.completed, Ordering::SeqCst);
            }))
            .run()
            .await
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 6);
        assert_eq!(max_completed.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_cancelled_run_reports_failed_and_resumes() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let token = CancellationToken::new();
        token.cancel();

        let metrics = runner(suite(2), backend.clone(), patch_instances(4), &dir)
            .with_cancellation(token)
            .run()
            .await
            .unwrap();

        assert_eq!(metrics.status, EvalStatus::Failed);
        assert_eq!(metrics.reason.as_deref(), Some(CANCELLED_REASON));
        assert_eq!(backend.calls(), 0);

        let metrics = runner(suite(2), backend.clone(), patch_instances(4), &dir)
            .run()
            .await
            .unwrap();
        assert_eq!(metrics.status, EvalStatus::Skipped);
        assert_eq!(backend.calls(), 4);
    }

    #[tokio::test]
    async fn test_no_harness_configured_is_skipped() {
        let dir = TempDir::new().unwrap();
        let suite = suite(1).with_auto_evaluate(true);

        let metrics = runner(suite, Arc::new(FakeBackend::new()), patch_instances(1), &dir)
            .run()
            .await
            .unwrap();

        assert_eq!(metrics.status, EvalStatus::Skipped);
        assert_eq!(metrics.reason.as_deref(), Some("no harness configured"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_harness_receives_converted_predictions() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("harness.sh");
        std::fs::write(
            &script,
            r#"
while [ $# -gt 0 ]; do
  case "$1" in
    --output_dir) out="$2"; shift ;;
    --predictions_path) preds="$2"; shift ;;
  esac
  shift
done
mkdir -p "$out"
n=$(grep -c model_name_or_path "$preds")
echo "{\"resolved\": 1, \"total\": $n}" > "$out/results.json"
"#,
        )
        .unwrap();
        let harness = HarnessConfig {
            command: vec!["sh".into(), script.display().to_string()],
            ..HarnessConfig::default()
        };
        let suite = suite(2).with_auto_evaluate(true).with_harness(harness);
        let backend = Arc::new(FakeBackend::new().fail_on("task-3"));

        let runner = runner(suite, backend, patch_instances(4), &dir);
        let metrics = runner.run().await.unwrap();

        assert_eq!(metrics.status, EvalStatus::Completed);
        assert_eq!(metrics.total, Some(3));
        assert!(runner.harness_predictions_path().exists());
        assert!(runner.evaluation_dir().join("results.json").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_harness_scores_only_selected_instances() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(FakeBackend::new());
        runner(suite(2), backend.clone(), patch_instances(5), &dir)
            .run()
            .await
            .unwrap();

        let script = dir.path().join("harness.sh");
        std::fs::write(
            &script,
            r#"
while [ $# -gt 0 ]; do
  case "$1" in
    --output_dir) out="$2"; shift ;;
    --predictions_path) preds="$2"; shift ;;
  esac
  shift
done
mkdir -p "$out"
n=$(grep -c model_name_or_path "$preds")
echo "{\"resolved\": 0, \"total\": $n}" > "$out/results.json"
"#,
        )
        .unwrap();
        let harness = HarnessConfig {
            command: vec!["sh".into(), script.display().to_string()],
            ..HarnessConfig::default()
        };
        let narrowed = suite(2)
            .with_instance_limit(2)
            .with_auto_evaluate(true)
            .with_harness(harness);

        let metrics = runner(narrowed, backend.clone(), patch_instances(5), &dir)
            .run()
            .await
            .unwrap();

        assert_eq!(backend.calls(), 5);
        assert_eq!(metrics.status, EvalStatus::Completed);
        assert_eq!(metrics.total, Some(2));
        assert_eq!(metrics.generation.unwrap().total, 2);
    }
}
