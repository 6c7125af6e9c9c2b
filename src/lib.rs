//! Gauge: benchmark execution engine for language models
//!
//! Re-exports the configuration and inference layer from [`gauge_core`] and
//! the suite runner, harness adapter and reporting from [`gauge_eval`].
//!
//! ```no_run
//! use gauge::{DatasetSource, ModelEndpoint, Orchestrator, RunConfig, SuiteConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::new(ModelEndpoint::new("my-model", "http://localhost:8000/v1"))
//!     .with_suite(SuiteConfig::new("swebench_lite", DatasetSource::new("lite.jsonl")));
//! let report = Orchestrator::from_config(config)?.run().await?;
//! println!("{}", gauge::generate_table(&report));
//! # Ok(())
//! # }
//! ```

pub use gauge_core as core;
pub use gauge_eval as eval;

pub use gauge_core::{
    ApiStyle, DatasetSource, GaugeError, GaugeResult, Generation, GenerationError,
    HarnessConfig, HttpInferenceClient, InferenceBackend, ModelEndpoint, RetryPolicy, RunConfig,
    SuiteConfig, init_logging,
};
pub use gauge_eval::{
    BenchError, BenchResult, BenchmarkRunner, ConsolidatedReport, EvalStatus, EvaluationMetrics,
    FileDataset, HarnessAdapter, Orchestrator, PromptStrategy, ResultStore, SuiteReport,
    TaskInstance, TaskResult, convert_predictions, generate_table,
};
