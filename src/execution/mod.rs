//! Pipeline execution engine

pub mod breaker;
pub mod engine;
pub mod executor;
pub mod health;

pub use breaker::{BreakerState, CircuitBreakerRegistry};
pub use engine::{EventHandler, ExecutionEvent, Orchestrator};
pub use executor::{StepError, StepExecutor, StepFailure, StepOutput};
pub use health::{probe_components, ComponentHealth};
