//! Integration tests for failure classification, retry, and abort behavior

use baton::llm::{BackendError, MockCompletionClient, MockReply};
use baton::pipeline::{
    ExecutionPolicy, FailureKind, PhaseSpec, PipelineError, PipelineRunner, RunState,
};
use std::sync::Arc;
use std::time::Duration;

fn zero_wait_policy() -> ExecutionPolicy {
    ExecutionPolicy::new().with_initial_backoff(Duration::ZERO)
}

#[test]
fn test_duplicate_ids_fail_before_any_backend_call() {
    let client = Arc::new(MockCompletionClient::new());
    client.add_reply(MockReply::text("never sent"));

    let phases = vec![
        PhaseSpec::new("theme", "a"),
        PhaseSpec::new("schedule", "b"),
        PhaseSpec::new("theme", "c"),
    ];
    let result = PipelineRunner::new(phases, client.clone(), zero_wait_policy(), "m");

    assert!(matches!(result, Err(PipelineError::Configuration(_))));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_transient_then_success_single_write() {
    let client = Arc::new(MockCompletionClient::new());
    client.add_replies(vec![
        MockReply::error(BackendError::TimeoutError { seconds: 30 }),
        MockReply::text("second attempt"),
        MockReply::text("next phase"),
    ]);

    let phases = vec![
        PhaseSpec::new("flaky", "persona"),
        PhaseSpec::new("steady", "persona"),
    ];
    let runner = PipelineRunner::new(phases, client.clone(), zero_wait_policy(), "m").unwrap();
    let outcome = runner.run().await;

    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.store.get("flaky").unwrap(), "second attempt");
    assert_eq!(outcome.store.len(), 2);

    let flaky = &outcome.summary.phases[0];
    assert_eq!(flaky.attempts, 2);
    assert_eq!(flaky.retries, 1);
}

#[tokio::test]
async fn test_rate_limited_fallback_failure_leaves_no_write() {
    let client = Arc::new(MockCompletionClient::new());
    client.add_replies(vec![MockReply::rate_limited(), MockReply::rate_limited()]);

    let phases = vec![PhaseSpec::new("theme", "persona")];
    let runner = PipelineRunner::new(
        phases,
        client.clone(),
        zero_wait_policy().with_fallback_model("small"),
        "large",
    )
    .unwrap();
    let outcome = runner.run().await;

    match &outcome.state {
        RunState::Failed { phase_id, kind } => {
            assert_eq!(phase_id, "theme");
            assert_eq!(*kind, FailureKind::RateLimited);
        }
        other => panic!("expected failed state, got {other:?}"),
    }

    // Primary attempt plus exactly one fallback attempt
    assert_eq!(client.call_count(), 2);
    assert!(outcome.store.is_empty());
}

#[tokio::test]
async fn test_permanent_failure_skips_all_later_phases() {
    let client = Arc::new(MockCompletionClient::new());
    client.add_replies(vec![
        MockReply::text("THEME_OUT"),
        MockReply::error(BackendError::ApiError {
            message: "invalid request".to_string(),
            status_code: Some(400),
        }),
        MockReply::text("never requested"),
    ]);

    let phases = vec![
        PhaseSpec::new("theme", "a"),
        PhaseSpec::new("schedule", "b"),
        PhaseSpec::new("budget", "c"),
    ];
    let runner = PipelineRunner::new(phases, client.clone(), zero_wait_policy(), "m").unwrap();
    let outcome = runner.run().await;

    match &outcome.state {
        RunState::Failed { phase_id, kind } => {
            assert_eq!(phase_id, "schedule");
            assert_eq!(*kind, FailureKind::Permanent);
        }
        other => panic!("expected failed state, got {other:?}"),
    }

    // No retry for the permanent failure, no call for the aborted phase
    assert_eq!(client.call_count(), 2);
    assert!(outcome.store.contains("theme"));
    assert!(!outcome.store.contains("schedule"));
    assert!(!outcome.store.contains("budget"));

    // Furthest phase reached is reported with its attempt count
    let failure = outcome.summary.failure.as_ref().unwrap();
    assert_eq!(failure.phase_id, "schedule");
    assert_eq!(failure.attempts, 1);
}

#[tokio::test]
async fn test_transient_exhaustion_respects_attempt_budget() {
    let client = Arc::new(MockCompletionClient::new());
    client.add_replies(vec![
        MockReply::transient("reset"),
        MockReply::transient("reset"),
        MockReply::transient("reset"),
        MockReply::transient("reset"),
    ]);

    let phases = vec![PhaseSpec::new("theme", "persona")];
    let runner = PipelineRunner::new(
        phases,
        client.clone(),
        zero_wait_policy().with_max_attempts(2),
        "m",
    )
    .unwrap();
    let outcome = runner.run().await;

    match &outcome.state {
        RunState::Failed { kind, .. } => assert_eq!(*kind, FailureKind::Transient),
        other => panic!("expected failed state, got {other:?}"),
    }
    assert_eq!(client.call_count(), 2);
    assert_eq!(outcome.summary.failure.as_ref().unwrap().attempts, 2);
}
