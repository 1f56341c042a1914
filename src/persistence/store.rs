//! SQLite-based execution store

use crate::core::PipelineExecution;
use crate::persistence::ExecutionStore;
use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

/// SQLite execution store. The full execution record is stored as JSON,
/// with summary columns for filtering and ordering.
pub struct SqliteExecutionStore {
    pool: SqlitePool,
}

impl SqliteExecutionStore {
    /// Create a new SQLite store, creating the database file if needed
    pub async fn new(db_path: &str) -> Result<Self> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Create store with default path under the local data directory
    pub async fn with_default_path() -> Result<Self> {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let db_dir = data_dir.join("relay");
        std::fs::create_dir_all(&db_dir)?;

        let db_path = db_dir.join("executions.db");
        let db_path = db_path
            .to_str()
            .context("Default database path is not valid UTF-8")?;
        Self::new(db_path).await
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS executions (
                id TEXT PRIMARY KEY,
                mode TEXT NOT NULL,
                status TEXT NOT NULL,
                started_at TEXT NOT NULL,
                finished_at TEXT,
                total_duration_ms REAL,
                record TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_status ON executions(status);
            CREATE INDEX IF NOT EXISTS idx_started_at ON executions(started_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ExecutionStore for SqliteExecutionStore {
    async fn save(&self, execution: &PipelineExecution) -> Result<()> {
        let record = serde_json::to_string(execution)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO executions
            (id, mode, status, started_at, finished_at, total_duration_ms, record)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&execution.execution_id)
        .bind(execution.mode.config_key())
        .bind(format!("{:?}", execution.status))
        .bind(execution.started_at.to_rfc3339())
        .bind(execution.finished_at.map(|t| t.to_rfc3339()))
        .bind(execution.total_duration_ms)
        .bind(record)
        .execute(&self.pool)
        .await
        .context("Failed to save execution")?;

        Ok(())
    }

    async fn load(&self, execution_id: &str) -> Result<Option<PipelineExecution>> {
        let row = sqlx::query("SELECT record FROM executions WHERE id = ?1")
            .bind(execution_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load execution")?;

        match row {
            Some(row) => {
                let record: String = row.get("record");
                let execution = serde_json::from_str(&record)
                    .context("Failed to decode stored execution record")?;
                Ok(Some(execution))
            }
            None => Ok(None),
        }
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<PipelineExecution>> {
        let rows =
            sqlx::query("SELECT record FROM executions ORDER BY started_at DESC LIMIT ?1")
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
                .context("Failed to list executions")?;

        let mut executions = Vec::with_capacity(rows.len());
        for row in rows {
            let record: String = row.get("record");
            executions.push(
                serde_json::from_str(&record)
                    .context("Failed to decode stored execution record")?,
            );
        }
        Ok(executions)
    }
}
