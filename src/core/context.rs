//! Accumulated pipeline data passed from step to step

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The running data context of one execution.
///
/// Starts as the caller's input payload; each completed step's output is
/// merged in, so later steps see everything produced so far. Owned
/// exclusively by the execution that created it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineContext {
    data: Map<String, Value>,
}

impl PipelineContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from an input payload
    pub fn from_map(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// Get a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Set a field
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Whether a field is present
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Merge step output into the context, overwriting existing fields
    pub fn merge(&mut self, output: Map<String, Value>) {
        self.data.extend(output);
    }

    /// Required fields that the context does not (yet) hold
    pub fn missing_fields(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|field| !self.data.contains_key(field.as_str()))
            .cloned()
            .collect()
    }

    /// A copy of the current data, used as step input snapshots and
    /// request bodies
    pub fn snapshot(&self) -> Map<String, Value> {
        self.data.clone()
    }

    /// Number of fields currently held
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the context holds no fields
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
