//! Orchestrator configuration from YAML

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Pipeline mode selected by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    Quick,
    Analysis,
    Full,
}

impl PipelineMode {
    /// The key this mode uses in `routing.bypass_modes`
    pub fn config_key(&self) -> &'static str {
        match self {
            PipelineMode::Quick => "quick_mode",
            PipelineMode::Analysis => "analysis_mode",
            PipelineMode::Full => "full_pipeline",
        }
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

/// Top-level orchestrator configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Step definitions
    pub sequence: SequenceConfig,

    /// Mode routing tables
    pub routing: RoutingConfig,

    /// Downstream components by name
    pub components: HashMap<String, ComponentConfig>,

    /// Retry, fallback and circuit-breaker policy
    #[serde(default)]
    pub error_handling: ErrorHandlingConfig,
}

/// The step catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceConfig {
    pub steps: Vec<StepConfig>,
}

/// Step configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Unique step name
    pub name: String,

    /// Component this step calls
    pub component: String,

    /// Disabled steps are recorded as skipped and never called
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Endpoint path, appended to the component base URL
    pub endpoint: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Additional attempts after the first
    #[serde(default = "default_retry_count")]
    pub retry_count: usize,

    /// Fields that must be present in the context before the call
    #[serde(default)]
    pub required_fields: Vec<String>,

    /// Fields the component is expected to return (informational)
    #[serde(default)]
    pub output_fields: Vec<String>,
}

/// Mode routing tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// The critical flow; a step listed here aborts the run on
    /// unrecoverable failure
    pub default_flow: Vec<String>,

    /// Step sequences per mode key (`quick_mode`, `analysis_mode`,
    /// `full_pipeline`); a mode without an entry falls back to `default_flow`
    #[serde(default)]
    pub bypass_modes: HashMap<String, Vec<String>>,
}

/// A downstream component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Human-readable name
    #[serde(default)]
    pub name: Option<String>,

    /// Base URL, e.g. `http://127.0.0.1:8001`
    pub base_url: String,

    /// Health check path
    #[serde(default = "default_health_endpoint")]
    pub health_endpoint: String,

    /// Disabled components are reported as such and never probed
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Retry, fallback and circuit-breaker policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHandlingConfig {
    /// Per-attempt delays in seconds; the last value is reused for attempts
    /// beyond the list length
    #[serde(default = "default_retry_delays")]
    pub retry_delays: Vec<f64>,

    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,

    /// Substitute payload merged into the context when a critical step fails
    #[serde(default)]
    pub fallback_responses: HashMap<String, Map<String, Value>>,
}

impl Default for ErrorHandlingConfig {
    fn default() -> Self {
        Self {
            retry_delays: default_retry_delays(),
            circuit_breaker: CircuitBreakerConfig::default(),
            fallback_responses: HashMap::new(),
        }
    }
}

/// Circuit breaker thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Failure count at which the breaker opens
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: usize,

    /// Seconds after the last failure before a trial call is allowed
    #[serde(default = "default_recovery_timeout")]
    pub recovery_timeout: f64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: default_failure_threshold(),
            recovery_timeout: default_recovery_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> f64 {
    30.0
}

fn default_retry_count() -> usize {
    1
}

fn default_health_endpoint() -> String {
    "/health".to_string()
}

fn default_retry_delays() -> Vec<f64> {
    vec![1.0, 2.0, 5.0]
}

fn default_failure_threshold() -> usize {
    5
}

fn default_recovery_timeout() -> f64 {
    60.0
}

impl StepConfig {
    /// Per-call timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }
}

impl PipelineConfig {
    /// Load orchestrator configuration from a YAML (or JSON) file.
    ///
    /// A missing or malformed file is a fatal error, surfaced to the
    /// caller rather than defaulted.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config file {}: {}", path.display(), e))?;
        Self::from_yaml(&content)
    }

    /// Parse orchestrator configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration eagerly so that dangling references fail
    /// at load time, not mid-execution
    pub fn validate(&self) -> Result<()> {
        // Step names must be unique
        let mut seen = std::collections::HashSet::new();
        for step in &self.sequence.steps {
            if !seen.insert(&step.name) {
                anyhow::bail!("Duplicate step name: {}", step.name);
            }
        }

        // Every step must reference a known component
        for step in &self.sequence.steps {
            if !self.components.contains_key(&step.component) {
                anyhow::bail!(
                    "Step '{}' references unknown component '{}'",
                    step.name,
                    step.component
                );
            }
        }

        // Routing flows may only name known steps
        let step_names: std::collections::HashSet<_> =
            self.sequence.steps.iter().map(|s| &s.name).collect();
        for step_name in &self.routing.default_flow {
            if !step_names.contains(step_name) {
                anyhow::bail!("default_flow references unknown step '{}'", step_name);
            }
        }
        for (mode, flow) in &self.routing.bypass_modes {
            for step_name in flow {
                if !step_names.contains(step_name) {
                    anyhow::bail!(
                        "bypass mode '{}' references unknown step '{}'",
                        mode,
                        step_name
                    );
                }
            }
        }

        // Fallback payloads must belong to known steps
        for step_name in self.error_handling.fallback_responses.keys() {
            if !step_names.contains(step_name) {
                anyhow::bail!(
                    "fallback response configured for unknown step '{}'",
                    step_name
                );
            }
        }

        if self.error_handling.retry_delays.is_empty() {
            anyhow::bail!("error_handling.retry_delays must not be empty");
        }

        Ok(())
    }

    /// Look up a step definition by name
    pub fn step(&self, name: &str) -> Option<&StepConfig> {
        self.sequence.steps.iter().find(|s| s.name == name)
    }

    /// Look up a component by name
    pub fn component(&self, name: &str) -> Option<&ComponentConfig> {
        self.components.get(name)
    }

    /// Resolve the step sequence for a mode, falling back to the default
    /// flow when the mode has no bypass entry
    pub fn resolve_sequence(&self, mode: PipelineMode) -> &[String] {
        self.routing
            .bypass_modes
            .get(mode.config_key())
            .unwrap_or(&self.routing.default_flow)
    }

    /// Whether a step belongs to the critical default flow
    pub fn is_critical(&self, step_name: &str) -> bool {
        self.routing.default_flow.iter().any(|s| s == step_name)
    }

    /// Fallback payload for a step, if configured
    pub fn fallback(&self, step_name: &str) -> Option<&Map<String, Value>> {
        self.error_handling.fallback_responses.get(step_name)
    }

    /// Per-attempt retry delays as durations
    pub fn retry_delays(&self) -> Vec<Duration> {
        self.error_handling
            .retry_delays
            .iter()
            .map(|secs| Duration::from_secs_f64(*secs))
            .collect()
    }
}
