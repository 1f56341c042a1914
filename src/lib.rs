//! relay - a resilient HTTP service pipeline orchestrator

pub mod cli;
pub mod client;
pub mod core;
pub mod execution;
pub mod persistence;

// Re-export commonly used types
pub use client::{ClientError, HealthProbe, HttpServiceClient, ServiceClient};
pub use core::{
    ExecutionStatus, PipelineConfig, PipelineContext, PipelineExecution, PipelineMetrics,
    PipelineMode, StepRecord, StepRegistry, StepSpec, StepStatus,
};
pub use execution::{
    BreakerState, CircuitBreakerRegistry, ComponentHealth, ExecutionEvent, Orchestrator,
    StepError, StepExecutor, StepFailure,
};
pub use persistence::{ExecutionStore, InMemoryStore};
