//! Test: critical vs non-critical step failures, fallback substitution

use crate::helpers::*;
use relay::{PipelineMode, StepStatus};
use serde_json::json;

/// A critical step with no fallback aborts the run; nothing after it runs
#[tokio::test]
async fn test_critical_failure_without_fallback_aborts() {
    // summarize has retry_count 2, so three attempts all fail
    let orchestrator = demo_orchestrator(vec![
        MockOutcome::Transport("connection refused".to_string()),
        MockOutcome::Transport("connection refused".to_string()),
        MockOutcome::Transport("connection refused".to_string()),
    ]);

    let execution = orchestrator
        .execute(sample_input(), PipelineMode::Quick, None)
        .await;

    assert_failed(&execution);
    assert!(execution.error.as_ref().unwrap().contains("summarize"));

    // The failed step is the last record; respond never ran
    assert_eq!(execution.steps.len(), 1);
    assert_eq!(step_status(&execution, "summarize"), StepStatus::Failed);
    assert!(execution.step("respond").is_none());
    assert_eq!(orchestrator.client().call_count(), 3);
}

/// A critical step with a fallback payload completes degraded and the
/// pipeline continues on the substituted data
#[tokio::test]
async fn test_critical_failure_with_fallback_continues() {
    let orchestrator = demo_orchestrator(vec![
        summarize_ok(),
        // process_summary has retry_count 1: both attempts fail
        MockOutcome::Status(500),
        MockOutcome::Status(500),
        respond_ok(),
        search_ok(),
        metrics_ok(),
    ]);

    let execution = orchestrator
        .execute(sample_input(), PipelineMode::Full, None)
        .await;

    assert_completed(&execution);

    let process = execution.step("process_summary").unwrap();
    assert_eq!(process.status, StepStatus::Completed);
    assert!(process.degraded);
    assert!(process.error.as_ref().unwrap().contains("HTTP 500"));
    assert_eq!(process.attempts, 2);
    assert_eq!(
        process.output.as_ref().unwrap().get("task_id"),
        Some(&json!("task_fallback"))
    );

    // The fallback fields reached the downstream context
    let respond = execution.step("respond").unwrap();
    assert_eq!(
        respond.input.as_ref().unwrap().get("task_id"),
        Some(&json!("task_fallback"))
    );
}

/// A bypass-only step failure is recorded but does not fail the run
#[tokio::test]
async fn test_non_critical_failure_continues() {
    let orchestrator = demo_orchestrator(vec![
        summarize_ok(),
        process_ok(),
        respond_ok(),
        search_ok(),
        // metrics has retry_count 1: both attempts fail
        MockOutcome::Transport("connection refused".to_string()),
        MockOutcome::Timeout,
    ]);

    let execution = orchestrator
        .execute(sample_input(), PipelineMode::Full, None)
        .await;

    assert_completed(&execution);

    let metrics = execution.step("metrics").unwrap();
    assert_eq!(metrics.status, StepStatus::Failed);
    assert!(metrics.error.is_some());
    assert!(!metrics.degraded);

    for name in ["summarize", "process_summary", "respond", "search_similar"] {
        assert_eq!(step_status(&execution, name), StepStatus::Completed);
    }
}

/// Missing required input fields fail the step without any HTTP attempt
#[tokio::test]
async fn test_missing_required_fields_fail_without_call() {
    let orchestrator = demo_orchestrator(vec![]);

    // No message_text or timestamp
    let input = fields(&[("user_id", json!("user_42")), ("platform", json!("email"))]);
    let execution = orchestrator.execute(input, PipelineMode::Quick, None).await;

    assert_failed(&execution);

    let summarize = execution.step("summarize").unwrap();
    assert_eq!(summarize.status, StepStatus::Failed);
    assert_eq!(summarize.attempts, 0);
    let error = summarize.error.as_ref().unwrap();
    assert!(error.contains("missing required fields"));
    assert!(error.contains("message_text"));

    // Validation failures never reach the wire
    assert_eq!(orchestrator.client().call_count(), 0);
}
