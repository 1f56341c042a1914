//! Persistence layer for pipeline execution history

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteExecutionStore;

use crate::core::PipelineExecution;
use anyhow::Result;
use std::collections::HashMap;

/// Trait for execution record stores
#[async_trait::async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Save a finalized execution record (replacing any previous record
    /// with the same id)
    async fn save(&self, execution: &PipelineExecution) -> Result<()>;

    /// Load an execution by id
    async fn load(&self, execution_id: &str) -> Result<Option<PipelineExecution>>;

    /// List executions, most recently started first
    async fn list_recent(&self, limit: usize) -> Result<Vec<PipelineExecution>>;
}

/// In-memory store (for testing or ephemeral use)
pub struct InMemoryStore {
    executions: tokio::sync::RwLock<HashMap<String, PipelineExecution>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            executions: tokio::sync::RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ExecutionStore for InMemoryStore {
    async fn save(&self, execution: &PipelineExecution) -> Result<()> {
        let mut executions = self.executions.write().await;
        executions.insert(execution.execution_id.clone(), execution.clone());
        Ok(())
    }

    async fn load(&self, execution_id: &str) -> Result<Option<PipelineExecution>> {
        let executions = self.executions.read().await;
        Ok(executions.get(execution_id).cloned())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<PipelineExecution>> {
        let executions = self.executions.read().await;
        let mut result: Vec<_> = executions.values().cloned().collect();
        result.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        result.truncate(limit);
        Ok(result)
    }
}
