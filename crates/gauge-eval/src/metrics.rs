//! Per-suite evaluation metrics

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tasks::TaskResult;

/// Terminal state of a suite's evaluation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalStatus {
    /// Harness ran and its results were parsed
    Completed,
    /// Evaluation disabled or harness unavailable
    Skipped,
    /// Harness exited non-zero, timed out, or the run was cancelled
    Failed,
    /// Harness could not be started or its output was unreadable
    Error,
    /// Harness succeeded but wrote no results file
    NoResults,
}

impl EvalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvalStatus::Completed => "completed",
            EvalStatus::Skipped => "skipped",
            EvalStatus::Failed => "failed",
            EvalStatus::Error => "error",
            EvalStatus::NoResults => "no_results",
        }
    }
}

/// Generation counts taken from the result store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl GenerationStats {
    pub fn from_results(results: &[TaskResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        }
    }
}

/// What a suite reports back to the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub status: EvalStatus,

    #[serde(rename = "pass@1", default, skip_serializing_if = "Option::is_none")]
    pub pass_at_1: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationStats>,

    /// Suite-specific extras
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EvaluationMetrics {
    fn with_status(status: EvalStatus) -> Self {
        Self {
            status,
            pass_at_1: None,
            resolved: None,
            total: None,
            reason: None,
            error: None,
            generation: None,
            extra: Map::new(),
        }
    }

    /// Scored run; pass@1 is 0 when total is 0
    pub fn completed(resolved: u64, total: u64) -> Self {
        Self {
            pass_at_1: Some(pass_rate(resolved, total)),
            resolved: Some(resolved),
            total: Some(total),
            ..Self::with_status(EvalStatus::Completed)
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::with_status(EvalStatus::Skipped)
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::with_status(EvalStatus::Failed)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::with_status(EvalStatus::Error)
        }
    }

    pub fn no_results() -> Self {
        Self::with_status(EvalStatus::NoResults)
    }

    /// Attach captured error output
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_generation(mut self, stats: GenerationStats) -> Self {
        self.generation = Some(stats);
        self
    }
}

/// `resolved / total`, or 0 when nothing was evaluated
pub fn pass_rate(resolved: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        resolved as f64 / total as f64
    }
}
