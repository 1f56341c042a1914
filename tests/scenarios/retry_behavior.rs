//! Test: per-step retry budget and breaker accounting

use crate::helpers::*;
use relay::{BreakerState, PipelineMode};
use std::time::Instant;

/// A step with retry_count N is attempted at most N+1 times and succeeds
/// as soon as one attempt does
#[tokio::test]
async fn test_success_after_transient_failures() {
    // summarize has retry_count 2: two failures, then success
    let orchestrator = demo_orchestrator(vec![
        MockOutcome::Transport("connection reset".to_string()),
        MockOutcome::Status(503),
        summarize_ok(),
        respond_ok(),
    ]);

    let execution = orchestrator
        .execute(sample_input(), PipelineMode::Quick, None)
        .await;

    assert_completed(&execution);
    assert_eq!(execution.step("summarize").unwrap().attempts, 3);
    assert_eq!(execution.step("respond").unwrap().attempts, 1);
    assert_eq!(orchestrator.client().call_count(), 4);

    // The eventual success reset the breaker
    assert_eq!(orchestrator.breaker_failures("summarizer").await, 0);
    assert_eq!(
        orchestrator.breaker_state("summarizer").await,
        BreakerState::Closed
    );
}

/// Exhausting the budget records exactly one breaker failure, not one
/// per attempt
#[tokio::test]
async fn test_exhausted_retries_record_one_breaker_failure() {
    let orchestrator = demo_orchestrator(vec![
        MockOutcome::Status(502),
        MockOutcome::Status(502),
        MockOutcome::Status(502),
    ]);

    let execution = orchestrator
        .execute(sample_input(), PipelineMode::Quick, None)
        .await;

    assert_failed(&execution);
    assert_eq!(execution.step("summarize").unwrap().attempts, 3);
    assert_eq!(orchestrator.client().call_count(), 3);

    // Three attempts, one failure record; threshold 2 not yet reached
    assert_eq!(orchestrator.breaker_failures("summarizer").await, 1);
    assert_eq!(
        orchestrator.breaker_state("summarizer").await,
        BreakerState::Closed
    );
}

/// The configured delays actually sit between attempts
#[tokio::test]
async fn test_retry_delays_are_applied() {
    // Demo config delays are 5ms then 10ms; three attempts sleep both
    let orchestrator = demo_orchestrator(vec![
        MockOutcome::Timeout,
        MockOutcome::Timeout,
        MockOutcome::Timeout,
    ]);

    let started = Instant::now();
    let execution = orchestrator
        .execute(sample_input(), PipelineMode::Quick, None)
        .await;
    let elapsed = started.elapsed();

    assert_failed(&execution);
    assert!(
        elapsed.as_secs_f64() >= 0.015,
        "expected at least 15ms of retry delay, got {:?}",
        elapsed
    );
}
