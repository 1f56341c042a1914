//! Test utility functions for relay scenarios

use async_trait::async_trait;
use relay::{
    ClientError, ExecutionStatus, HealthProbe, Orchestrator, PipelineConfig, PipelineExecution,
    ServiceClient, StepStatus,
};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted outcome for one mock call
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Successful call returning these output fields
    Ok(Map<String, Value>),
    /// Non-2xx HTTP status
    Status(u16),
    /// Transport-level failure
    Transport(String),
    /// Client-side timeout
    Timeout,
}

/// Build a JSON object from key/value pairs
pub fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn ok(pairs: &[(&str, Value)]) -> MockOutcome {
    MockOutcome::Ok(fields(pairs))
}

/// Mock client that replays scripted step outcomes in order and records
/// every attempted call. Health probe outcomes are keyed by URL because
/// probe order over a component map is not deterministic.
pub struct MockServiceClient {
    outcomes: Mutex<VecDeque<MockOutcome>>,
    probes: Mutex<HashMap<String, MockOutcome>>,
    calls: Mutex<Vec<String>>,
}

impl MockServiceClient {
    pub fn new(outcomes: Vec<MockOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            probes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Script the outcome of a health probe for a URL
    pub fn with_probe(self, url: &str, outcome: MockOutcome) -> Self {
        self.probes.lock().unwrap().insert(url.to_string(), outcome);
        self
    }

    /// Number of calls attempted so far (steps and probes)
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// URLs of every attempted call, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServiceClient for MockServiceClient {
    async fn post_json(
        &self,
        url: &str,
        _body: &Map<String, Value>,
        timeout: Duration,
    ) -> Result<Map<String, Value>, ClientError> {
        self.calls.lock().unwrap().push(url.to_string());

        match self.outcomes.lock().unwrap().pop_front() {
            None => Err(ClientError::Transport {
                url: url.to_string(),
                message: "mock: no scripted outcome left".to_string(),
            }),
            Some(MockOutcome::Ok(fields)) => Ok(fields),
            Some(MockOutcome::Status(status)) => Err(ClientError::Status {
                url: url.to_string(),
                status,
            }),
            Some(MockOutcome::Transport(message)) => Err(ClientError::Transport {
                url: url.to_string(),
                message,
            }),
            Some(MockOutcome::Timeout) => Err(ClientError::Timeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }

    async fn probe(&self, url: &str, timeout: Duration) -> Result<HealthProbe, ClientError> {
        self.calls.lock().unwrap().push(url.to_string());

        match self.probes.lock().unwrap().remove(url) {
            None => Err(ClientError::Transport {
                url: url.to_string(),
                message: "mock: no scripted probe".to_string(),
            }),
            Some(MockOutcome::Ok(fields)) => Ok(HealthProbe {
                status: 200,
                body: Some(Value::Object(fields)),
            }),
            Some(MockOutcome::Status(status)) => Ok(HealthProbe { status, body: None }),
            Some(MockOutcome::Transport(message)) => Err(ClientError::Transport {
                url: url.to_string(),
                message,
            }),
            Some(MockOutcome::Timeout) => Err(ClientError::Timeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }
}

/// The configuration used by most scenarios: three critical steps
/// (default flow) plus two bypass-only steps, five components, fast
/// retry delays, and a fallback payload for `process_summary`.
pub fn demo_config_yaml() -> &'static str {
    r#"
sequence:
  steps:
    - name: "summarize"
      component: "summarizer"
      endpoint: "/api/summarize"
      timeout: 5
      retry_count: 2
      required_fields: ["user_id", "platform", "message_text", "timestamp"]
      output_fields: ["summary_id", "summary", "intent", "urgency"]
    - name: "process_summary"
      component: "processor"
      endpoint: "/api/process_summary"
      timeout: 5
      retry_count: 1
      required_fields: ["summary_id", "summary", "intent", "urgency", "user_id"]
      output_fields: ["task_id", "task_summary", "priority"]
    - name: "respond"
      component: "responder"
      endpoint: "/api/respond"
      timeout: 5
      retry_count: 1
      required_fields: ["user_id"]
      output_fields: ["response_id", "response_text"]
    - name: "search_similar"
      component: "context_search"
      endpoint: "/api/search_similar"
      timeout: 5
      retry_count: 1
      required_fields: ["summary_id"]
      output_fields: ["related"]
    - name: "metrics"
      component: "collector"
      endpoint: "/api/metrics"
      timeout: 5
      retry_count: 1
      output_fields: ["recorded"]

routing:
  default_flow: ["summarize", "process_summary", "respond"]
  bypass_modes:
    quick_mode: ["summarize", "respond"]
    full_pipeline: ["summarize", "process_summary", "respond", "search_similar", "metrics"]

components:
  summarizer:
    name: "SmartBrief Summarizer"
    base_url: "http://127.0.0.1:8001"
  processor:
    name: "Task Processor"
    base_url: "http://127.0.0.1:8002"
  responder:
    name: "Response Agent"
    base_url: "http://127.0.0.1:8003"
  context_search:
    name: "Context Service"
    base_url: "http://127.0.0.1:8004"
  collector:
    name: "Metrics Collector"
    base_url: "http://127.0.0.1:8006"

error_handling:
  retry_delays: [0.005, 0.01]
  circuit_breaker:
    enabled: true
    failure_threshold: 2
    recovery_timeout: 0.05
  fallback_responses:
    process_summary:
      task_id: "task_fallback"
      task_summary: "Fallback task"
      priority: "low"
"#
}

pub fn demo_config() -> PipelineConfig {
    PipelineConfig::from_yaml(demo_config_yaml()).unwrap()
}

/// Orchestrator over the demo config with scripted step outcomes
pub fn demo_orchestrator(outcomes: Vec<MockOutcome>) -> Orchestrator<MockServiceClient> {
    Orchestrator::new(demo_config(), MockServiceClient::new(outcomes)).unwrap()
}

/// An input payload that satisfies the first step's required fields
pub fn sample_input() -> Map<String, Value> {
    fields(&[
        ("user_id", json!("user_42")),
        ("platform", json!("email")),
        ("message_text", json!("book a hotel in berlin")),
        ("timestamp", json!("2024-06-01T09:30:00Z")),
    ])
}

// Scripted happy-path outputs, one per demo step

pub fn summarize_ok() -> MockOutcome {
    ok(&[
        ("summary_id", json!("sum_1")),
        ("summary", json!("Book a hotel in Berlin")),
        ("intent", json!("travel")),
        ("urgency", json!("medium")),
    ])
}

pub fn process_ok() -> MockOutcome {
    ok(&[
        ("task_id", json!("task_1")),
        ("task_summary", json!("Create hotel booking task")),
        ("priority", json!("medium")),
    ])
}

pub fn respond_ok() -> MockOutcome {
    ok(&[
        ("response_id", json!("resp_1")),
        ("response_text", json!("I can book that for you")),
    ])
}

pub fn search_ok() -> MockOutcome {
    ok(&[("related", json!(["sum_0"]))])
}

pub fn metrics_ok() -> MockOutcome {
    ok(&[("recorded", json!(true))])
}

// Assertion helpers

pub fn assert_completed(execution: &PipelineExecution) {
    assert_eq!(
        execution.status,
        ExecutionStatus::Completed,
        "expected completed execution, got {:?} (error: {:?})",
        execution.status,
        execution.error
    );
}

pub fn assert_failed(execution: &PipelineExecution) {
    assert_eq!(
        execution.status,
        ExecutionStatus::Failed,
        "expected failed execution, got {:?}",
        execution.status
    );
}

pub fn step_status(execution: &PipelineExecution, name: &str) -> StepStatus {
    execution
        .step(name)
        .unwrap_or_else(|| panic!("no step record named '{}'", name))
        .status
}
