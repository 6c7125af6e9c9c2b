//! Task instances and their results

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One unit of work from a benchmark dataset
///
/// Everything other than `instance_id` is suite-specific payload, kept as raw
/// JSON so that prompt strategies pick out the fields they need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    pub instance_id: String,

    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl TaskInstance {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            payload: Map::new(),
        }
    }

    /// Add a string payload field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.insert(key.into(), Value::String(value.into()));
        self
    }

    /// String payload field, if present
    pub fn field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

/// Outcome of generating for one task instance
///
/// Written once to the result store and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub instance_id: String,

    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResult {
    /// Successful result carrying strategy output
    pub fn succeeded(instance_id: impl Into<String>, output: Map<String, Value>) -> Self {
        Self {
            instance_id: instance_id.into(),
            success: true,
            output: Some(output),
            error: None,
        }
    }

    /// Failed result carrying the error message
    pub fn failed(instance_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }

    /// String output field, if present
    pub fn output_str(&self, key: &str) -> Option<&str> {
        self.output
            .as_ref()
            .and_then(|o| o.get(key))
            .and_then(Value::as_str)
    }
}
