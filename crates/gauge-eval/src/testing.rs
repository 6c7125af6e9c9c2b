//! Fakes shared by unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gauge_core::{Generation, GenerationError, GenerationOutcome, InferenceBackend, SuiteConfig};

use crate::error::{BenchError, BenchResult};
use crate::tasks::{DatasetLoader, TaskInstance};

/// Instances `task-0..n` with the fields patch strategies need
pub fn patch_instances(n: usize) -> Vec<TaskInstance> {
    (0..n)
        .map(|i| {
            let id = format!("task-{}", i);
            TaskInstance::new(&id)
                .with_field("repo", "example/project")
                .with_field("problem_statement", format!("Crash in {} handler", id))
        })
        .collect()
}

/// Backend that echoes a patch, failing for prompts containing a marker
pub struct FakeBackend {
    fail_marker: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            fail_marker: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn fail_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }

    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceBackend for FakeBackend {
    async fn generate(&self, prompt: &str) -> GenerationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.fail_marker {
            Some(marker) if prompt.contains(marker.as_str()) => Err(GenerationError::Server {
                status: 500,
                body: "internal error".into(),
            }),
            _ => Ok(Generation {
                text: "diff --git a/app.py b/app.py\n--- a/app.py\n+++ b/app.py\n".into(),
                attempts: 1,
            }),
        }
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

/// Dataset returning a fixed list, or failing
pub struct StaticDataset {
    instances: Vec<TaskInstance>,
    failure: Option<String>,
}

impl StaticDataset {
    pub fn new(instances: Vec<TaskInstance>) -> Self {
        Self {
            instances,
            failure: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            instances: Vec::new(),
            failure: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl DatasetLoader for StaticDataset {
    async fn load(&self, _suite: &SuiteConfig) -> BenchResult<Vec<TaskInstance>> {
        match &self.failure {
            Some(message) => Err(BenchError::Dataset(message.clone())),
            None => Ok(self.instances.clone()),
        }
    }
}
