//! Per-suite configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where a suite's task instances come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSource {
    /// Local `.jsonl` or `.json` file
    pub path: PathBuf,
}

impl DatasetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// External scoring harness invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Program followed by its leading arguments
    #[serde(default = "default_harness_command")]
    pub command: Vec<String>,

    /// Value passed as `--dataset_name`
    #[serde(default = "default_dataset_name")]
    pub dataset_name: String,

    /// Hard wall-clock budget for one harness run
    #[serde(default = "default_harness_timeout_secs")]
    pub timeout_secs: u64,

    /// Appended after the standard arguments
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Rewrite the result store into harness prediction format first
    #[serde(default = "default_true")]
    pub convert_predictions: bool,
}

fn default_harness_command() -> Vec<String> {
    vec![
        "python".to_string(),
        "-m".to_string(),
        "swebench.harness.run_evaluation".to_string(),
    ]
}

fn default_dataset_name() -> String {
    "princeton-nlp/SWE-bench_Lite".to_string()
}

fn default_harness_timeout_secs() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            command: default_harness_command(),
            dataset_name: default_dataset_name(),
            timeout_secs: default_harness_timeout_secs(),
            extra_args: Vec::new(),
            convert_predictions: true,
        }
    }
}

impl HarnessConfig {
    /// Harness running the given program with no leading arguments
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            command: vec![program.into()],
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_dataset_name(mut self, name: impl Into<String>) -> Self {
        self.dataset_name = name.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration for one benchmark suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Unique suite name; also the output subdirectory
    pub name: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cap on the number of instances processed (after the offset)
    #[serde(default, alias = "num_instances")]
    pub instance_limit: Option<usize>,

    /// Number of leading instances to skip
    #[serde(default, alias = "start_index")]
    pub starting_offset: usize,

    /// Size of the generation worker pool
    #[serde(default = "default_concurrency_limit", alias = "parallel_tasks")]
    pub concurrency_limit: usize,

    /// Append each result as soon as it is produced
    #[serde(default = "default_true", alias = "save_incremental")]
    pub incremental_persistence: bool,

    /// Run the harness once generation finishes
    #[serde(default = "default_true")]
    pub auto_evaluate: bool,

    /// Prompt strategy name
    #[serde(default = "default_prompt_strategy")]
    pub prompt_strategy: String,

    pub dataset: DatasetSource,

    #[serde(default)]
    pub harness: Option<HarnessConfig>,
}

fn default_concurrency_limit() -> usize {
    4
}

fn default_prompt_strategy() -> String {
    "minimal".to_string()
}

impl SuiteConfig {
    /// Create a suite with default settings
    pub fn new(name: impl Into<String>, dataset: DatasetSource) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            instance_limit: None,
            starting_offset: 0,
            concurrency_limit: default_concurrency_limit(),
            incremental_persistence: true,
            auto_evaluate: true,
            prompt_strategy: default_prompt_strategy(),
            dataset,
            harness: None,
        }
    }

    pub fn with_instance_limit(mut self, limit: usize) -> Self {
        self.instance_limit = Some(limit);
        self
    }

    pub fn with_starting_offset(mut self, offset: usize) -> Self {
        self.starting_offset = offset;
        self
    }

    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_prompt_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.prompt_strategy = strategy.into();
        self
    }

    pub fn with_harness(mut self, harness: HarnessConfig) -> Self {
        self.harness = Some(harness);
        self
    }

    pub fn with_auto_evaluate(mut self, auto_evaluate: bool) -> Self {
        self.auto_evaluate = auto_evaluate;
        self
    }

    pub fn with_incremental_persistence(mut self, incremental: bool) -> Self {
        self.incremental_persistence = incremental;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Apply `starting_offset` then `instance_limit` to a loaded sequence
    pub fn select<T>(&self, items: Vec<T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.starting_offset);
        match self.instance_limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }

    /// Resolve a relative dataset path against the config file's directory
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        if self.dataset.path.is_relative() {
            self.dataset.path = base_dir.join(&self.dataset.path);
        }
    }
}
