//! Gauge benchmark engine
//!
//! Runs benchmark suites against a model endpoint:
//!
//! - [`Orchestrator`]: runs each enabled suite in turn and writes the
//!   consolidated report
//! - [`BenchmarkRunner`]: loads one suite's instances, generates with a
//!   bounded worker pool, persists results, then evaluates
//! - [`HarnessAdapter`]: scores predictions with an external process
//! - [`ResultStore`]: the append-only JSONL checkpoint used for resume

pub mod convert;
pub mod error;
pub mod harness;
pub mod metrics;
pub mod orchestrator;
pub mod prompts;
pub mod report;
pub mod runner;
pub mod store;
pub mod tasks;

#[cfg(test)]
mod testing;

pub use convert::{ConversionSummary, HarnessPrediction, convert_predictions, convert_selected};
pub use error::{BenchError, BenchResult};
pub use harness::HarnessAdapter;
pub use metrics::{EvalStatus, EvaluationMetrics, GenerationStats, pass_rate};
pub use orchestrator::Orchestrator;
pub use prompts::{PromptError, PromptStrategy};
pub use report::{ConsolidatedReport, REPORT_FILE, SuiteReport, SuiteReports, generate_table};
pub use runner::{BenchmarkRunner, ProgressCallback, RunProgress, RunStage};
pub use store::ResultStore;
pub use tasks::{DatasetLoader, FileDataset, TaskInstance, TaskResult};
