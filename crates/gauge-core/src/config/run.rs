//! Top-level run configuration

use super::logging_config::LoggingConfig;
use super::model::ModelEndpoint;
use super::suite::SuiteConfig;
use crate::error::{GaugeError, GaugeResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Everything needed to run a set of benchmark suites against one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub model: ModelEndpoint,

    /// Suites in declaration order; this is also report order
    #[serde(default)]
    pub suites: Vec<SuiteConfig>,

    /// Root for per-suite artifacts and the consolidated report
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Write `consolidated_report.json` at the end of the run
    #[serde(default = "default_generate_report")]
    pub generate_report: bool,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./outputs")
}

fn default_generate_report() -> bool {
    true
}

impl RunConfig {
    pub fn new(model: ModelEndpoint) -> Self {
        Self {
            model,
            suites: Vec::new(),
            output_dir: default_output_dir(),
            generate_report: true,
            logging: LoggingConfig::default(),
        }
    }

    pub fn with_suite(mut self, suite: SuiteConfig) -> Self {
        self.suites.push(suite);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Enabled suites, in declaration order
    pub fn enabled_suites(&self) -> impl Iterator<Item = &SuiteConfig> {
        self.suites.iter().filter(|s| s.enabled)
    }

    /// Directory holding one suite's artifacts
    pub fn suite_dir(&self, suite_name: &str) -> PathBuf {
        self.output_dir.join(suite_name)
    }

    /// Resolve relative paths against the directory the config was loaded from
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        for suite in &mut self.suites {
            suite.resolve_paths(base_dir);
        }
    }

    /// Structural validation, run before any suite starts
    pub fn validate(&self) -> GaugeResult<()> {
        if self.model.name.trim().is_empty() {
            return Err(GaugeError::config("model.name must not be empty"));
        }
        if self.model.base_url.trim().is_empty() {
            return Err(GaugeError::config("model.base_url must not be empty"));
        }
        if self.model.retry.max_attempts == 0 {
            return Err(GaugeError::config("model.retry.max_attempts must be at least 1"));
        }
        if self.model.request_timeout_secs == 0 {
            return Err(GaugeError::config("model.request_timeout_secs must be positive"));
        }

        let mut seen = HashSet::new();
        for suite in &self.suites {
            if suite.name.trim().is_empty() {
                return Err(GaugeError::config("suite name must not be empty"));
            }
            if !is_plain_dir_name(&suite.name) {
                return Err(GaugeError::config(format!(
                    "suite name '{}' must be a single path component",
                    suite.name
                )));
            }
            if !seen.insert(suite.name.as_str()) {
                return Err(GaugeError::config(format!(
                    "duplicate suite name '{}'",
                    suite.name
                )));
            }
            if suite.concurrency_limit == 0 {
                return Err(GaugeError::config_with_context(
                    "concurrency_limit must be at least 1",
                    format!("suite '{}'", suite.name),
                ));
            }
            if let Some(harness) = &suite.harness {
                if harness.command.is_empty() {
                    return Err(GaugeError::config_with_context(
                        "harness.command must name a program",
                        format!("suite '{}'", suite.name),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// A name usable as one directory under `output_dir`
fn is_plain_dir_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}
