//! Execution state models

use crate::core::config::PipelineMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status of a single step within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

impl StepStatus {
    /// Check if the status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Failed | StepStatus::Skipped
        )
    }
}

/// Overall status of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl ExecutionStatus {
    /// Check if the status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

fn millis_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let delta = end.signed_duration_since(start);
    delta
        .num_microseconds()
        .map_or_else(|| delta.num_milliseconds() as f64, |us| us as f64 / 1000.0)
}

/// One executed (or skipped) step of a run.
///
/// Mutated only while its status is in progress; immutable once terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step name, unique within a run
    pub name: String,

    /// Owning component
    pub component: String,

    pub status: StepStatus,

    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<f64>,

    /// Context snapshot taken when the step began
    pub input: Option<Map<String, Value>>,

    /// Fields the step produced (or the fallback payload, when degraded)
    pub output: Option<Map<String, Value>>,

    /// Failure message, kept even when a fallback rescued the step
    pub error: Option<String>,

    /// Call attempts consumed, including the first
    pub attempts: usize,

    /// True when the output came from a configured fallback payload
    /// rather than the component itself
    pub degraded: bool,
}

impl StepRecord {
    /// Create an in-progress record with an input snapshot
    pub fn started(name: &str, component: &str, input: Map<String, Value>) -> Self {
        Self {
            name: name.to_string(),
            component: component.to_string(),
            status: StepStatus::InProgress,
            started_at: Some(Utc::now()),
            finished_at: None,
            duration_ms: None,
            input: Some(input),
            output: None,
            error: None,
            attempts: 0,
            degraded: false,
        }
    }

    /// Create a terminal record for a step that was never called
    pub fn skipped(name: &str, component: &str) -> Self {
        Self {
            name: name.to_string(),
            component: component.to_string(),
            status: StepStatus::Skipped,
            started_at: None,
            finished_at: None,
            duration_ms: None,
            input: None,
            output: None,
            error: None,
            attempts: 0,
            degraded: false,
        }
    }

    /// Mark the step completed with its output fields
    pub fn complete(&mut self, output: Map<String, Value>) {
        self.status = StepStatus::Completed;
        self.output = Some(output);
        self.finish();
    }

    /// Mark the step failed
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = StepStatus::Failed;
        self.error = Some(error.into());
        self.finish();
    }

    /// Upgrade a failed critical step whose fallback payload was applied.
    /// The step counts as completed, the error stays on record.
    pub fn complete_degraded(&mut self, fallback: Map<String, Value>) {
        self.status = StepStatus::Completed;
        self.output = Some(fallback);
        self.degraded = true;
    }

    fn finish(&mut self) {
        let finished = Utc::now();
        self.finished_at = Some(finished);
        if let Some(started) = self.started_at {
            self.duration_ms = Some(millis_between(started, finished));
        }
    }
}

/// One end-to-end pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineExecution {
    /// Unique execution identifier
    pub execution_id: String,

    pub mode: PipelineMode,
    pub status: ExecutionStatus,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total_duration_ms: Option<f64>,

    /// Steps in execution order
    pub steps: Vec<StepRecord>,

    /// Top-level error when the run failed before completion
    pub error: Option<String>,
}

impl PipelineExecution {
    /// Create an in-progress execution record
    pub fn begin(execution_id: String, mode: PipelineMode) -> Self {
        Self {
            execution_id,
            mode,
            status: ExecutionStatus::InProgress,
            started_at: Utc::now(),
            finished_at: None,
            total_duration_ms: None,
            steps: Vec::new(),
            error: None,
        }
    }

    /// Mark the execution failed
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = ExecutionStatus::Failed;
        self.error = Some(error.into());
    }

    /// Mark the execution completed
    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
    }

    /// Stamp the end timestamp and total duration. Called exactly once,
    /// whatever the terminal status.
    pub fn finalize(&mut self) {
        let finished = Utc::now();
        self.finished_at = Some(finished);
        self.total_duration_ms = Some(millis_between(self.started_at, finished));
    }

    /// Number of completed steps
    pub fn completed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count()
    }

    /// Number of failed steps
    pub fn failed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
            .count()
    }

    /// Find a step record by name
    pub fn step(&self, name: &str) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// Aggregate metrics over a set of executions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineMetrics {
    pub total_executions: usize,
    pub successful_executions: usize,
    pub failed_executions: usize,
    pub success_rate_percent: f64,
    pub avg_duration_ms: f64,
    pub last_execution: Option<DateTime<Utc>>,
}

impl PipelineMetrics {
    /// Compute metrics over an execution list (any order)
    pub fn from_executions(executions: &[PipelineExecution]) -> Self {
        let successful: Vec<_> = executions
            .iter()
            .filter(|e| e.status == ExecutionStatus::Completed)
            .collect();
        let failed = executions
            .iter()
            .filter(|e| e.status == ExecutionStatus::Failed)
            .count();

        let avg_duration_ms = if successful.is_empty() {
            0.0
        } else {
            let total: f64 = successful
                .iter()
                .map(|e| e.total_duration_ms.unwrap_or(0.0))
                .sum();
            total / successful.len() as f64
        };

        let success_rate_percent = if executions.is_empty() {
            0.0
        } else {
            successful.len() as f64 / executions.len() as f64 * 100.0
        };

        Self {
            total_executions: executions.len(),
            successful_executions: successful.len(),
            failed_executions: failed,
            success_rate_percent: round2(success_rate_percent),
            avg_duration_ms: round2(avg_duration_ms),
            last_execution: executions.iter().map(|e| e.started_at).max(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
