//! Dataset loading from local JSON and JSONL files

use std::path::Path;

use async_trait::async_trait;
use gauge_core::SuiteConfig;

use super::TaskInstance;
use crate::error::{BenchError, BenchResult};

/// Source of task instances for a suite
///
/// A failure here is fatal for the suite.
#[async_trait]
pub trait DatasetLoader: Send + Sync {
    /// Load every instance of the suite, in dataset order
    async fn load(&self, suite: &SuiteConfig) -> BenchResult<Vec<TaskInstance>>;
}

/// Reads the file named by the suite's dataset source
///
/// `.json` files hold an array of instances; anything else is read as JSON
/// Lines with one instance per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDataset;

#[async_trait]
impl DatasetLoader for FileDataset {
    async fn load(&self, suite: &SuiteConfig) -> BenchResult<Vec<TaskInstance>> {
        let path = &suite.dataset.path;
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BenchError::dataset_at(path, e))?;

        let instances = parse_instances(path, &content)?;
        tracing::debug!(
            suite = %suite.name,
            path = %path.display(),
            count = instances.len(),
            "loaded dataset"
        );
        Ok(instances)
    }
}

fn parse_instances(path: &Path, content: &str) -> BenchResult<Vec<TaskInstance>> {
    let is_array = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_array {
        return serde_json::from_str(content).map_err(|e| BenchError::dataset_at(path, e));
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .map_err(|e| BenchError::dataset_at(path, format!("line {}: {}", idx + 1, e)))
        })
        .collect()
}
