//! Test: point-in-time component health reporting

use crate::helpers::*;
use relay::{ComponentHealth, Orchestrator, PipelineConfig};
use serde_json::json;

fn health_config() -> PipelineConfig {
    PipelineConfig::from_yaml(
        r#"
sequence:
  steps: []

routing:
  default_flow: []

components:
  summarizer:
    base_url: "http://127.0.0.1:8001"
  processor:
    base_url: "http://127.0.0.1:8002"
  responder:
    base_url: "http://127.0.0.1:8003"
    health_endpoint: "/healthz"
  collector:
    base_url: "http://127.0.0.1:8006"
    enabled: false
"#,
    )
    .unwrap()
}

#[tokio::test]
async fn test_probe_reports_each_component_state() {
    let client = MockServiceClient::new(vec![])
        .with_probe(
            "http://127.0.0.1:8001/health",
            ok(&[("service", json!("summarizer")), ("ready", json!(true))]),
        )
        .with_probe("http://127.0.0.1:8002/health", MockOutcome::Status(503))
        .with_probe(
            "http://127.0.0.1:8003/healthz",
            MockOutcome::Transport("connection refused".to_string()),
        );
    let orchestrator = Orchestrator::new(health_config(), client).unwrap();

    let health = orchestrator.component_health().await;
    assert_eq!(health.len(), 4);

    match &health["summarizer"] {
        ComponentHealth::Healthy {
            response_time_ms,
            details,
        } => {
            assert!(*response_time_ms >= 0.0);
            assert_eq!(
                details.as_ref().unwrap().get("service"),
                Some(&json!("summarizer"))
            );
        }
        other => panic!("expected healthy summarizer, got {:?}", other),
    }

    assert!(matches!(
        health["processor"],
        ComponentHealth::Unhealthy { http_status: 503 }
    ));
    assert!(matches!(
        health["responder"],
        ComponentHealth::Unreachable { .. }
    ));
    assert!(matches!(health["collector"], ComponentHealth::Disabled));

    // The disabled component was never probed
    assert_eq!(orchestrator.client().call_count(), 3);
}

#[tokio::test]
async fn test_is_healthy_helper() {
    let client = MockServiceClient::new(vec![]).with_probe(
        "http://127.0.0.1:8001/health",
        ok(&[("ready", json!(true))]),
    );
    let orchestrator = Orchestrator::new(health_config(), client).unwrap();

    let health = orchestrator.component_health().await;
    assert!(health["summarizer"].is_healthy());
    assert!(!health["processor"].is_healthy());
    assert!(!health["collector"].is_healthy());
}
