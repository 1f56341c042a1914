//! Step executor - one HTTP call per pipeline step, with retry and
//! circuit-breaker accounting

use crate::client::{ClientError, ServiceClient};
use crate::core::{PipelineContext, StepSpec};
use crate::execution::breaker::CircuitBreakerRegistry;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error types for step execution
#[derive(Debug, Error)]
pub enum StepError {
    /// The component is circuit-broken; the call was never attempted
    #[error("circuit breaker open for component {0}")]
    CircuitOpen(String),

    /// Required context fields absent; a caller/config bug, not transient
    #[error("missing required fields for step '{step}': {fields:?}")]
    MissingFields { step: String, fields: Vec<String> },

    /// The last transport/HTTP error after the retry budget was exhausted
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Successful step outcome
#[derive(Debug)]
pub struct StepOutput {
    /// Parsed response body, merged into the context by the orchestrator
    pub fields: Map<String, Value>,

    /// Call attempts consumed, including the first
    pub attempts: usize,
}

/// Failed step outcome
#[derive(Debug)]
pub struct StepFailure {
    pub error: StepError,

    /// Call attempts consumed, including the first (zero when the call
    /// was never attempted)
    pub attempts: usize,
}

/// Executes a single step against its component
pub struct StepExecutor<C> {
    client: C,
    breakers: Arc<CircuitBreakerRegistry>,
    retry_delays: Vec<Duration>,
}

impl<C: ServiceClient> StepExecutor<C> {
    pub fn new(client: C, breakers: Arc<CircuitBreakerRegistry>, retry_delays: Vec<Duration>) -> Self {
        Self {
            client,
            breakers,
            retry_delays,
        }
    }

    /// The underlying service client (also used for health probes)
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Delay before retrying after the given failed attempt (0-based);
    /// the last configured delay is reused past the end of the list
    fn retry_delay(&self, attempt: usize) -> Duration {
        match self.retry_delays.as_slice() {
            [] => Duration::ZERO,
            delays => delays[attempt.min(delays.len() - 1)],
        }
    }

    /// Execute a step and return its output fields.
    ///
    /// The breaker is consulted once up front; required fields are
    /// validated once before the first attempt. Transient call failures
    /// are retried up to the step's budget, and exactly one breaker
    /// failure is recorded when the budget is exhausted.
    pub async fn execute(
        &self,
        step: &StepSpec,
        context: &PipelineContext,
    ) -> Result<StepOutput, StepFailure> {
        if self.breakers.is_open(&step.component).await {
            return Err(StepFailure {
                error: StepError::CircuitOpen(step.component.clone()),
                attempts: 0,
            });
        }

        let missing = context.missing_fields(&step.required_fields);
        if !missing.is_empty() {
            return Err(StepFailure {
                error: StepError::MissingFields {
                    step: step.name.clone(),
                    fields: missing,
                },
                attempts: 0,
            });
        }

        // Required fields plus pass-through of all accumulated state
        let body = context.snapshot();

        let mut attempt = 0;
        loop {
            debug!("calling {} (attempt {})", step.url, attempt + 1);

            match self.client.post_json(&step.url, &body, step.timeout).await {
                Ok(fields) => {
                    self.breakers.record_success(&step.component).await;
                    return Ok(StepOutput {
                        fields,
                        attempts: attempt + 1,
                    });
                }
                Err(e) => {
                    warn!(
                        "step {} attempt {} failed: {}",
                        step.name,
                        attempt + 1,
                        e
                    );

                    if attempt >= step.retry_count {
                        self.breakers.record_failure(&step.component).await;
                        return Err(StepFailure {
                            error: StepError::Client(e),
                            attempts: attempt + 1,
                        });
                    }

                    let delay = self.retry_delay(attempt);
                    info!("retrying step {} in {:.2}s", step.name, delay.as_secs_f64());
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
