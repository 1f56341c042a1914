//! Pipeline orchestrator - drives the step sequence for a requested mode

use crate::client::ServiceClient;
use crate::core::{
    ExecutionStatus, PipelineConfig, PipelineContext, PipelineExecution, PipelineMetrics,
    PipelineMode, StepRecord, StepRegistry,
};
use crate::execution::breaker::{BreakerState, CircuitBreakerRegistry};
use crate::execution::executor::StepExecutor;
use crate::execution::health::{probe_components, ComponentHealth};
use crate::persistence::ExecutionStore;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that occur during pipeline execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        execution_id: String,
        mode: PipelineMode,
    },
    StepStarted {
        step: String,
        component: String,
    },
    StepCompleted {
        step: String,
        duration_ms: f64,
    },
    StepFailed {
        step: String,
        error: String,
    },
    StepSkipped {
        step: String,
    },
    FallbackApplied {
        step: String,
    },
    PipelineCompleted {
        execution_id: String,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&ExecutionEvent) + Send + Sync>;

/// The pipeline orchestrator.
///
/// Construct one explicitly and share it behind an `Arc` if multiple
/// callers trigger executions; the circuit breaker registry and the
/// execution history are the only state shared across runs, and both sit
/// behind mutexes.
pub struct Orchestrator<C> {
    config: Arc<PipelineConfig>,
    registry: StepRegistry,
    executor: StepExecutor<C>,
    breakers: Arc<CircuitBreakerRegistry>,
    history: Mutex<Vec<PipelineExecution>>,
    event_handlers: Mutex<Vec<EventHandler>>,
    store: Option<Arc<dyn ExecutionStore>>,
}

impl<C: ServiceClient> Orchestrator<C> {
    /// Build an orchestrator from a validated configuration.
    ///
    /// Configuration problems (dangling step/component references, empty
    /// retry delays) surface here, before any execution.
    pub fn new(config: PipelineConfig, client: C) -> anyhow::Result<Self> {
        config.validate()?;
        let registry = StepRegistry::from_config(&config)?;
        let breakers = Arc::new(CircuitBreakerRegistry::new(
            &config.error_handling.circuit_breaker,
        ));
        let executor = StepExecutor::new(client, Arc::clone(&breakers), config.retry_delays());

        info!("orchestrator initialized with {} steps", registry.len());

        Ok(Self {
            config: Arc::new(config),
            registry,
            executor,
            breakers,
            history: Mutex::new(Vec::new()),
            event_handlers: Mutex::new(Vec::new()),
            store: None,
        })
    }

    /// Load configuration from a file and build an orchestrator
    pub fn from_config_path(path: &str, client: C) -> anyhow::Result<Self> {
        let config = PipelineConfig::from_file(path)?;
        Self::new(config, client)
    }

    /// Attach a store that receives every finalized execution record
    pub fn with_store(mut self, store: Arc<dyn ExecutionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Register an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.lock().await.push(Arc::new(handler));
    }

    async fn emit(&self, event: ExecutionEvent) {
        let handlers = self.event_handlers.lock().await;
        for handler in handlers.iter() {
            handler(&event);
        }
    }

    /// The active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Current breaker state for a component
    pub async fn breaker_state(&self, component: &str) -> BreakerState {
        self.breakers.state(component).await
    }

    /// Current breaker failure count for a component
    pub async fn breaker_failures(&self, component: &str) -> usize {
        self.breakers.failures(component).await
    }

    /// Execute the pipeline for an input payload and mode.
    ///
    /// Always returns a finalized execution record; step and run failures
    /// are captured in it, never raised.
    pub async fn execute(
        &self,
        input: Map<String, Value>,
        mode: PipelineMode,
        execution_id: Option<String>,
    ) -> PipelineExecution {
        self.execute_with_cancel(input, mode, execution_id, None)
            .await
    }

    /// Execute with a cooperative cancellation flag, checked at step
    /// boundaries only - an in-flight HTTP call is never interrupted.
    pub async fn execute_with_cancel(
        &self,
        input: Map<String, Value>,
        mode: PipelineMode,
        execution_id: Option<String>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> PipelineExecution {
        let execution_id =
            execution_id.unwrap_or_else(|| format!("exec_{}", Uuid::new_v4().simple()));
        let mut execution = PipelineExecution::begin(execution_id.clone(), mode);

        info!(
            "starting pipeline execution {} in {} mode",
            execution_id, mode
        );
        self.emit(ExecutionEvent::PipelineStarted {
            execution_id: execution_id.clone(),
            mode,
        })
        .await;

        let sequence: Vec<String> = self.config.resolve_sequence(mode).to_vec();
        let mut context = PipelineContext::from_map(input);

        self.run_steps(&mut execution, &sequence, &mut context, cancel.as_deref())
            .await;

        if execution.status != ExecutionStatus::Failed {
            execution.complete();
            info!("pipeline execution {} completed successfully", execution_id);
        } else {
            error!(
                "pipeline execution {} failed: {}",
                execution_id,
                execution.error.as_deref().unwrap_or("unknown error")
            );
        }

        execution.finalize();
        self.emit(ExecutionEvent::PipelineCompleted {
            execution_id: execution_id.clone(),
            status: execution.status,
        })
        .await;

        self.history.lock().await.push(execution.clone());

        if let Some(store) = &self.store {
            if let Err(e) = store.save(&execution).await {
                error!("failed to persist execution {}: {}", execution_id, e);
            }
        }

        execution
    }

    async fn run_steps(
        &self,
        execution: &mut PipelineExecution,
        sequence: &[String],
        context: &mut PipelineContext,
        cancel: Option<&AtomicBool>,
    ) {
        for step_name in sequence {
            if let Some(flag) = cancel {
                if flag.load(Ordering::SeqCst) {
                    warn!(
                        "execution {} cancelled before step {}",
                        execution.execution_id, step_name
                    );
                    execution.fail(format!("execution cancelled before step '{}'", step_name));
                    return;
                }
            }

            // Routing is validated against the registry at construction,
            // so a miss here means the orchestrator state itself is broken.
            let Some(step) = self.registry.get(step_name) else {
                execution.fail(format!("unknown step in routing sequence: '{}'", step_name));
                return;
            };

            if !step.enabled {
                info!("skipping disabled step: {}", step_name);
                execution
                    .steps
                    .push(StepRecord::skipped(step_name, &step.component));
                self.emit(ExecutionEvent::StepSkipped {
                    step: step_name.clone(),
                })
                .await;
                continue;
            }

            let mut record = StepRecord::started(step_name, &step.component, context.snapshot());
            self.emit(ExecutionEvent::StepStarted {
                step: step_name.clone(),
                component: step.component.clone(),
            })
            .await;

            match self.executor.execute(step, context).await {
                Ok(output) => {
                    record.attempts = output.attempts;
                    context.merge(output.fields.clone());
                    record.complete(output.fields);
                    info!(
                        "step {} completed in {:.2}ms",
                        step_name,
                        record.duration_ms.unwrap_or(0.0)
                    );
                    self.emit(ExecutionEvent::StepCompleted {
                        step: step_name.clone(),
                        duration_ms: record.duration_ms.unwrap_or(0.0),
                    })
                    .await;
                    execution.steps.push(record);
                }
                Err(failure) => {
                    record.attempts = failure.attempts;
                    let message = failure.error.to_string();
                    record.fail(message.clone());
                    error!("step {} failed: {}", step_name, message);
                    self.emit(ExecutionEvent::StepFailed {
                        step: step_name.clone(),
                        error: message.clone(),
                    })
                    .await;

                    if step.critical {
                        if let Some(fallback) = self.config.fallback(step_name) {
                            warn!("using fallback data for critical step {}", step_name);
                            context.merge(fallback.clone());
                            record.complete_degraded(fallback.clone());
                            self.emit(ExecutionEvent::FallbackApplied {
                                step: step_name.clone(),
                            })
                            .await;
                            execution.steps.push(record);
                        } else {
                            execution
                                .fail(format!("critical step '{}' failed: {}", step_name, message));
                            execution.steps.push(record);
                            return;
                        }
                    } else {
                        warn!(
                            "non-critical step {} failed, continuing pipeline",
                            step_name
                        );
                        execution.steps.push(record);
                    }
                }
            }
        }
    }

    /// Health of every configured component, probed on demand
    pub async fn component_health(&self) -> HashMap<String, ComponentHealth> {
        probe_components(self.executor.client(), &self.config.components).await
    }

    /// Recent executions, most recent first
    pub async fn history(&self, limit: usize) -> Vec<PipelineExecution> {
        let history = self.history.lock().await;
        let mut executions: Vec<_> = history.iter().cloned().collect();
        executions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        executions.truncate(limit);
        executions
    }

    /// Aggregate metrics over every run of this orchestrator's lifetime
    pub async fn metrics(&self) -> PipelineMetrics {
        let history = self.history.lock().await;
        PipelineMetrics::from_executions(&history)
    }

    /// The underlying service client
    pub fn client(&self) -> &C {
        self.executor.client()
    }
}
