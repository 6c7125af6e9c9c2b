//! Consolidated run report
//!
//! Written once per run as `consolidated_report.json`. Suites appear in the
//! order they were declared.

mod table;

pub use table::generate_table;

use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};
use crate::metrics::EvaluationMetrics;

/// File name of the consolidated report inside the output directory
pub const REPORT_FILE: &str = "consolidated_report.json";

/// One suite's entry in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuiteReport {
    Metrics(EvaluationMetrics),
    /// The suite could not run at all
    Error { error: String },
}

impl SuiteReport {
    pub fn error(message: impl Into<String>) -> Self {
        SuiteReport::Error {
            error: message.into(),
        }
    }

    pub fn metrics(&self) -> Option<&EvaluationMetrics> {
        match self {
            SuiteReport::Metrics(metrics) => Some(metrics),
            SuiteReport::Error { .. } => None,
        }
    }

    /// Why the suite could not run, if it could not
    pub fn error_message(&self) -> Option<&str> {
        match self {
            SuiteReport::Error { error } => Some(error),
            SuiteReport::Metrics(_) => None,
        }
    }
}

/// Suite entries keyed by name, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuiteReports(IndexMap<String, SuiteReport>);

impl SuiteReports {
    /// Insert or replace the entry for `name`; a replaced entry keeps its position
    pub fn insert(&mut self, name: impl Into<String>, report: SuiteReport) {
        self.0.insert(name.into(), report);
    }

    pub fn get(&self, name: &str) -> Option<&SuiteReport> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SuiteReport)> {
        self.0.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Results of every suite in a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedReport {
    pub model: String,
    pub timestamp: DateTime<Utc>,
    pub benchmarks: SuiteReports,
}

impl ConsolidatedReport {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            timestamp: Utc::now(),
            benchmarks: SuiteReports::default(),
        }
    }

    /// Write the report as pretty JSON, creating the parent directory
    pub async fn write(&self, path: &Path) -> BenchResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| BenchError::Io(format!("failed to write {}: {}", path.display(), e)))
    }

    /// Read a report written by [`ConsolidatedReport::write`]
    pub async fn load(path: &Path) -> BenchResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BenchError::Io(format!("failed to read {}: {}", path.display(), e)))?;
        Ok(serde_json::from_str(&content)?)
    }
}
