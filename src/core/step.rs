//! Typed step registry resolved from configuration

use crate::core::config::PipelineConfig;
use anyhow::Result;
use std::collections::HashMap;
use std::time::Duration;

/// A step definition with its component reference resolved.
///
/// Built once at orchestrator construction; immutable afterwards.
#[derive(Debug, Clone)]
pub struct StepSpec {
    /// Unique step name
    pub name: String,

    /// Owning component name
    pub component: String,

    /// Full URL: component base URL + step endpoint
    pub url: String,

    /// Disabled steps are recorded as skipped
    pub enabled: bool,

    /// Per-call timeout
    pub timeout: Duration,

    /// Additional attempts after the first
    pub retry_count: usize,

    /// Fields that must be present in the context before the call
    pub required_fields: Vec<String>,

    /// Fields the component is expected to return (informational)
    pub output_fields: Vec<String>,

    /// Whether the step belongs to the critical default flow
    pub critical: bool,
}

/// Step definitions indexed by name.
///
/// Resolving every step against its component up front means an unknown
/// reference is a construction error, never an execution-time surprise.
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
    steps: HashMap<String, StepSpec>,
}

impl StepRegistry {
    /// Resolve all configured steps against their components
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let mut steps = HashMap::new();

        for step in &config.sequence.steps {
            let component = config.component(&step.component).ok_or_else(|| {
                anyhow::anyhow!(
                    "Step '{}' references unknown component '{}'",
                    step.name,
                    step.component
                )
            })?;

            let spec = StepSpec {
                name: step.name.clone(),
                component: step.component.clone(),
                url: format!("{}{}", component.base_url, step.endpoint),
                enabled: step.enabled,
                timeout: step.timeout(),
                retry_count: step.retry_count,
                required_fields: step.required_fields.clone(),
                output_fields: step.output_fields.clone(),
                critical: config.is_critical(&step.name),
            };
            steps.insert(spec.name.clone(), spec);
        }

        Ok(Self { steps })
    }

    /// Look up a step by name
    pub fn get(&self, name: &str) -> Option<&StepSpec> {
        self.steps.get(name)
    }

    /// Number of registered steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the registry holds no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
