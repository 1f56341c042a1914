//! Per-component circuit breaker registry

use crate::core::config::CircuitBreakerConfig;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Breaker state for one component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Normal operation
    Closed,
    /// Blocking calls until the recovery window elapses
    Open,
    /// One trial call permitted
    HalfOpen,
}

#[derive(Debug, Clone)]
struct ComponentBreaker {
    failures: usize,
    last_failure: Option<Instant>,
    state: BreakerState,
}

impl ComponentBreaker {
    fn new() -> Self {
        Self {
            failures: 0,
            last_failure: None,
            state: BreakerState::Closed,
        }
    }
}

/// Failure accounting for every downstream component, shared across
/// executions. Lives for the orchestrator's process lifetime; state is
/// not persisted (single-process scope).
pub struct CircuitBreakerRegistry {
    enabled: bool,
    failure_threshold: usize,
    recovery_timeout: Duration,
    breakers: Mutex<HashMap<String, ComponentBreaker>>,
}

impl CircuitBreakerRegistry {
    /// Create a registry from the configured thresholds
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            enabled: config.enabled,
            failure_threshold: config.failure_threshold,
            recovery_timeout: Duration::from_secs_f64(config.recovery_timeout),
            breakers: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a call to this component is currently blocked.
    ///
    /// Consulting an open breaker after the recovery window has elapsed
    /// moves it to half-open and lets one trial call through.
    pub async fn is_open(&self, component: &str) -> bool {
        if !self.enabled {
            return false;
        }

        let mut breakers = self.breakers.lock().await;
        let breaker = breakers
            .entry(component.to_string())
            .or_insert_with(ComponentBreaker::new);

        if breaker.state != BreakerState::Open {
            return false;
        }

        match breaker.last_failure {
            Some(at) if at.elapsed() > self.recovery_timeout => {
                breaker.state = BreakerState::HalfOpen;
                info!("circuit breaker for {} moved to half-open state", component);
                false
            }
            _ => true,
        }
    }

    /// Record one step failure against a component. Called once per
    /// exhausted step, not once per attempt.
    pub async fn record_failure(&self, component: &str) {
        let mut breakers = self.breakers.lock().await;
        let breaker = breakers
            .entry(component.to_string())
            .or_insert_with(ComponentBreaker::new);

        breaker.failures += 1;
        breaker.last_failure = Some(Instant::now());

        // A half-open breaker still carries its failure count, so one
        // failed trial call re-opens it here.
        if breaker.failures >= self.failure_threshold {
            breaker.state = BreakerState::Open;
            warn!("circuit breaker opened for component {}", component);
        }
    }

    /// Record a successful call, closing the breaker and clearing its
    /// failure count
    pub async fn record_success(&self, component: &str) {
        let mut breakers = self.breakers.lock().await;
        let breaker = breakers
            .entry(component.to_string())
            .or_insert_with(ComponentBreaker::new);

        breaker.failures = 0;
        breaker.state = BreakerState::Closed;
    }

    /// Current state of a component's breaker (closed when never seen)
    pub async fn state(&self, component: &str) -> BreakerState {
        let breakers = self.breakers.lock().await;
        breakers
            .get(component)
            .map_or(BreakerState::Closed, |b| b.state)
    }

    /// Current failure count of a component's breaker
    pub async fn failures(&self, component: &str) -> usize {
        let breakers = self.breakers.lock().await;
        breakers.get(component).map_or(0, |b| b.failures)
    }
}
