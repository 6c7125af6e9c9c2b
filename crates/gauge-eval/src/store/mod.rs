//! Append-only JSONL result store
//!
//! One [`TaskResult`] per line. The store is the only record of which
//! instances a suite has already processed, so re-running a suite against the
//! same file resumes where it stopped.

mod read_ops;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{BenchError, BenchResult};
use crate::tasks::TaskResult;

struct StoreState {
    file: File,
    seen: HashSet<String>,
    results: Vec<TaskResult>,
}

/// Result store for one suite
///
/// All reads and writes go through a single lock, so an append is either
/// fully visible or not at all.
pub struct ResultStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl ResultStore {
    /// Open `path`, loading any records already in it
    pub async fn open(path: impl Into<PathBuf>) -> BenchResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BenchError::store_at(parent, e))?;
        }

        let loaded = read_ops::load_existing(&path).await?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| BenchError::store_at(&path, format!("failed to open for append: {}", e)))?;

        // Terminate a partial last line so the next record starts cleanly.
        if loaded.needs_newline {
            file.write_all(b"\n")
                .await
                .map_err(|e| BenchError::store_at(&path, e))?;
        }

        Ok(Self {
            path,
            state: Mutex::new(StoreState {
                file,
                seen: loaded.seen,
                results: loaded.results,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a result for `instance_id` is already stored
    pub async fn contains(&self, instance_id: &str) -> bool {
        self.state.lock().await.seen.contains(instance_id)
    }

    /// Ids of every stored result
    pub async fn processed_ids(&self) -> HashSet<String> {
        self.state.lock().await.seen.clone()
    }

    /// Append one result
    ///
    /// Returns `false` without writing when the id is already stored.
    pub async fn append(&self, result: TaskResult) -> BenchResult<bool> {
        let mut state = self.state.lock().await;
        self.append_locked(&mut state, result).await
    }

    /// Append several results under one lock acquisition
    ///
    /// Returns how many were written.
    pub async fn append_batch(&self, results: Vec<TaskResult>) -> BenchResult<usize> {
        let mut state = self.state.lock().await;
        let mut written = 0;
        for result in results {
            if self.append_locked(&mut state, result).await? {
                written += 1;
            }
        }
        Ok(written)
    }

    async fn append_locked(&self, state: &mut StoreState, result: TaskResult) -> BenchResult<bool> {
        if state.seen.contains(&result.instance_id) {
            debug!(instance_id = %result.instance_id, "result already stored, skipping");
            return Ok(false);
        }

        let json = serde_json::to_string(&result)?;
        let mut json_line = String::with_capacity(json.len() + 1);
        json_line.push_str(&json);
        json_line.push('\n');

        state
            .file
            .write_all(json_line.as_bytes())
            .await
            .map_err(|e| BenchError::store_at(&self.path, format!("failed to write: {}", e)))?;
        state
            .file
            .flush()
            .await
            .map_err(|e| BenchError::store_at(&self.path, format!("failed to flush: {}", e)))?;

        state.seen.insert(result.instance_id.clone());
        state.results.push(result);
        Ok(true)
    }

    /// Snapshot of every stored result, in write order
    pub async fn results(&self) -> Vec<TaskResult> {
        self.state.lock().await.results.clone()
    }

    /// Number of stored results
    pub async fn len(&self) -> usize {
        self.state.lock().await.results.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn ok(id: &str) -> TaskResult {
        let mut output = Map::new();
        output.insert("model_patch".into(), json!("diff"));
        TaskResult::succeeded(id, output)
    }

    #[tokio::test]
    async fn test_append_and_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("suite").join("predictions.jsonl");

        let store = ResultStore::open(&path).await.unwrap();
        assert!(store.is_empty().await);
        assert!(store.append(ok("a")).await.unwrap());
        assert!(store.append(TaskResult::failed("b", "timeout")).await.unwrap());
        drop(store);

        let reopened = ResultStore::open(&path).await.unwrap();
        assert_eq!(reopened.len().await, 2);
        assert!(reopened.contains("a").await);
        assert!(reopened.contains("b").await);
        assert!(!reopened.contains("c").await);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_append_ignored() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::open(dir.path().join("p.jsonl")).await.unwrap();

        assert!(store.append(ok("a")).await.unwrap());
        assert!(!store.append(TaskResult::failed("a", "late")).await.unwrap());

        let results = store.results().await;
        assert_eq!(results.len(), 1);
        assert!(results[0].success);
    }

    #[tokio::test]
    async fn test_truncated_line_skipped_and_repaired() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.jsonl");
        std::fs::write(
            &path,
            "{\"instance_id\":\"a\",\"success\":true}\n{\"instance_id\":\"b\",\"succ",
        )
        .unwrap();

        let store = ResultStore::open(&path).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert!(!store.contains("b").await);

        store.append(ok("b")).await.unwrap();
        drop(store);

        let reopened = ResultStore::open(&path).await.unwrap();
        assert_eq!(reopened.len().await, 2);
        assert!(reopened.contains("b").await);
    }

    #[tokio::test]
    async fn test_torn_multibyte_tail_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.jsonl");
        let mut bytes = b"{\"instance_id\":\"a\",\"success\":true}\n".to_vec();
        bytes.extend_from_slice(b"{\"instance_id\":\"b\",\"success\":true,\"output\":{\"model_patch\":\"caf");
        bytes.push(0xC3);
        std::fs::write(&path, bytes).unwrap();

        let store = ResultStore::open(&path).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert!(store.contains("a").await);

        store.append(ok("b")).await.unwrap();
        drop(store);

        let reopened = ResultStore::open(&path).await.unwrap();
        assert_eq!(reopened.len().await, 2);
        assert!(reopened.contains("b").await);
    }

    #[tokio::test]
    async fn test_first_duplicate_on_disk_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.jsonl");
        std::fs::write(
            &path,
            "{\"instance_id\":\"a\",\"success\":false,\"error\":\"first\"}\n\
             {\"instance_id\":\"a\",\"success\":true}\n",
        )
        .unwrap();

        let store = ResultStore::open(&path).await.unwrap();
        let results = store.results().await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].error.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_concurrent_appends_produce_whole_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.jsonl");
        let store = Arc::new(ResultStore::open(&path).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append(ok(&format!("task-{}", i))).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<TaskResult> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(parsed.len(), 32);
    }

    #[tokio::test]
    async fn test_batch_append() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::open(dir.path().join("p.jsonl")).await.unwrap();
        store.append(ok("a")).await.unwrap();

        let written = store
            .append_batch(vec![ok("a"), ok("b"), ok("c")])
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(store.processed_ids().await.len(), 3);
    }
}
