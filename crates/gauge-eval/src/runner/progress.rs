//! Progress reporting for suite runs

use std::fmt;
use std::sync::Arc;

/// Callback invoked after each result is recorded
pub type ProgressCallback = Arc<dyn Fn(RunProgress) + Send + Sync>;

/// Progress update during generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProgress {
    /// Suite being run
    pub suite: String,
    /// Instances with a result, including those found in the store at start
    pub completed: usize,
    /// Instances selected for this run
    pub total: usize,
    /// Instance that just finished
    pub instance_id: String,
    pub success: bool,
}

/// Stage of a suite run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Loading,
    Generating,
    Persisting,
    Evaluating,
    Done,
    Failed,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Loading => "loading",
            RunStage::Generating => "generating",
            RunStage::Persisting => "persisting",
            RunStage::Evaluating => "evaluating",
            RunStage::Done => "done",
            RunStage::Failed => "failed",
        };
        f.write_str(name)
    }
}
