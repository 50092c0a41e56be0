//! Pipeline sequencing
//!
//! The runner owns the ordered phase list and drives the executor one phase
//! at a time. Order encodes a data dependency: every phase may depend on all
//! earlier outputs, none may depend on later ones. The runner never retries;
//! transient recovery is the executor's job.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::llm::CompletionClient;

use super::error::{FailureKind, PhaseFailure, PipelineError};
use super::executor::{PhaseExecutor, PhaseOutcome};
use super::phase::PhaseSpec;
use super::policy::ExecutionPolicy;
use super::store::ContextStore;

/// Cooperative cancellation checked at phase boundaries.
///
/// Cancelling never interrupts a completion request already in flight; the
/// run stops before the next phase starts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Run lifecycle: `Pending -> Running -> { Running, Failed, Completed }`.
///
/// `Failed` and `Completed` are terminal; `Failed` carries the failing phase
/// and error kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running { phase_id: String },
    Completed,
    Failed { phase_id: String, kind: FailureKind },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed { .. })
    }
}

/// Per-run observability for the caller's CLI/logging layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Outcomes for phases that completed, in execution order
    pub phases: Vec<PhaseOutcome>,
    /// Terminal failure, if the run did not complete
    pub failure: Option<PhaseFailure>,
}

impl RunSummary {
    /// Ids of phases that completed, in execution order.
    pub fn executed_ids(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.id.as_str()).collect()
    }
}

/// Everything a finished run materializes.
///
/// On failure the store still holds every output produced before the failing
/// phase, so callers may persist the partial result.
#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub model: String,
    pub state: RunState,
    pub store: ContextStore,
    pub summary: RunSummary,
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }
}

/// Checks a phase list for configuration errors, without touching a backend.
///
/// Rejected: an empty phase list, duplicate ids, and named-subset selectors
/// referencing ids that are not declared strictly earlier in the list.
pub fn validate_phases(phases: &[PhaseSpec]) -> Result<(), PipelineError> {
    if phases.is_empty() {
        return Err(PipelineError::Configuration(
            "Pipeline has no phases".to_string(),
        ));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for spec in phases {
        if !seen.insert(spec.id.as_str()) {
            return Err(PipelineError::Configuration(format!(
                "Duplicate phase id: {}",
                spec.id
            )));
        }

        for referenced in spec.selector.referenced_ids() {
            if !seen.contains(referenced.as_str()) || referenced == &spec.id {
                return Err(PipelineError::Configuration(format!(
                    "Phase '{}' selects context from '{}', which is not declared earlier in the pipeline",
                    spec.id, referenced
                )));
            }
        }
    }

    Ok(())
}

pub struct PipelineRunner {
    phases: Vec<PhaseSpec>,
    client: Arc<dyn CompletionClient>,
    policy: ExecutionPolicy,
    model: String,
    cancel: CancelToken,
}

impl PipelineRunner {
    /// Validates the configuration eagerly, before any backend call.
    pub fn new(
        phases: Vec<PhaseSpec>,
        client: Arc<dyn CompletionClient>,
        policy: ExecutionPolicy,
        model: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        validate_phases(&phases)?;

        Ok(Self {
            phases,
            client,
            policy,
            model: model.into(),
            cancel: CancelToken::new(),
        })
    }

    /// Token for cancelling this run between phases.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn phase_ids(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.id.as_str()).collect()
    }

    /// Drives every phase in declared order; consumes the runner since a run
    /// fully materializes or aborts, never resumes.
    pub async fn run(self) -> RunOutcome {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        info!(
            run_id = %run_id,
            phases = self.phases.len(),
            model = %self.model,
            "Starting pipeline run"
        );

        let executor = PhaseExecutor::new(self.client.clone(), self.policy.clone(), &self.model);
        let mut store = ContextStore::new();
        let mut outcomes: Vec<PhaseOutcome> = Vec::new();
        let mut failure: Option<PhaseFailure> = None;
        let mut state = RunState::Pending;

        for spec in &self.phases {
            if self.cancel.is_cancelled() {
                info!(run_id = %run_id, phase = %spec.id, "Run cancelled before phase");
                failure = Some(PhaseFailure {
                    phase_id: spec.id.clone(),
                    kind: FailureKind::Cancelled,
                    attempts: 0,
                    message: "run cancelled before phase started".to_string(),
                });
                break;
            }

            state = RunState::Running {
                phase_id: spec.id.clone(),
            };
            info!(run_id = %run_id, phase = %spec.id, "Starting phase");

            match executor.execute(spec, &mut store).await {
                Ok(outcome) => {
                    info!(
                        run_id = %run_id,
                        phase = %spec.id,
                        attempts = outcome.attempts,
                        duration_ms = outcome.duration.as_millis() as u64,
                        "Phase complete"
                    );
                    outcomes.push(outcome);
                }
                Err(PipelineError::Phase(phase_failure)) => {
                    error!(run_id = %run_id, phase = %spec.id, error = %phase_failure, "Phase failed, aborting run");
                    failure = Some(phase_failure);
                    break;
                }
                Err(other) => {
                    // Store/configuration errors past validation are wiring
                    // bugs; abort the run and surface them in the failure.
                    error!(run_id = %run_id, phase = %spec.id, error = %other, "Fatal pipeline error");
                    failure = Some(PhaseFailure {
                        phase_id: spec.id.clone(),
                        kind: FailureKind::Permanent,
                        attempts: 0,
                        message: other.to_string(),
                    });
                    break;
                }
            }
        }

        state = match &failure {
            Some(f) => RunState::Failed {
                phase_id: f.phase_id.clone(),
                kind: f.kind,
            },
            None => {
                debug_assert!(matches!(state, RunState::Running { .. }));
                RunState::Completed
            }
        };

        let finished_at = Utc::now();
        info!(
            run_id = %run_id,
            completed_phases = outcomes.len(),
            state = ?state,
            "Pipeline run finished"
        );

        RunOutcome {
            run_id,
            started_at,
            finished_at,
            model: self.model,
            state,
            store,
            summary: RunSummary {
                phases: outcomes,
                failure,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockCompletionClient, MockReply};
    use crate::pipeline::ContextSelector;
    use std::time::Duration;

    fn zero_wait_policy() -> ExecutionPolicy {
        ExecutionPolicy::new().with_initial_backoff(Duration::ZERO)
    }

    fn three_phases() -> Vec<PhaseSpec> {
        vec![
            PhaseSpec::new("theme", "You define the theme."),
            PhaseSpec::new("schedule", "You build the schedule."),
            PhaseSpec::new("budget", "You estimate the budget."),
        ]
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let client = Arc::new(MockCompletionClient::new());
        let result = PipelineRunner::new(vec![], client, zero_wait_policy(), "large");
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_duplicate_ids_rejected_before_any_call() {
        let client = Arc::new(MockCompletionClient::new());
        let phases = vec![
            PhaseSpec::new("theme", "a"),
            PhaseSpec::new("theme", "b"),
        ];
        let result = PipelineRunner::new(phases, client.clone(), zero_wait_policy(), "large");

        match result {
            Err(PipelineError::Configuration(message)) => assert!(message.contains("theme")),
            other => panic!("expected configuration error, got {:?}", other.map(|_| ())),
        }
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn test_forward_subset_reference_rejected() {
        let client = Arc::new(MockCompletionClient::new());
        let phases = vec![
            PhaseSpec::new("theme", "a").with_selector(ContextSelector::NamedSubset(vec![
                "schedule".to_string(),
            ])),
            PhaseSpec::new("schedule", "b"),
        ];
        let result = PipelineRunner::new(phases, client, zero_wait_policy(), "large");
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_self_subset_reference_rejected() {
        let client = Arc::new(MockCompletionClient::new());
        let phases = vec![PhaseSpec::new("theme", "a")
            .with_selector(ContextSelector::NamedSubset(vec!["theme".to_string()]))];
        let result = PipelineRunner::new(phases, client, zero_wait_policy(), "large");
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_phases_run_in_declared_order() {
        let client = Arc::new(MockCompletionClient::new());
        client.add_replies(vec![
            MockReply::text("THEME_OUT"),
            MockReply::text("SCHEDULE_OUT"),
            MockReply::text("BUDGET_OUT"),
        ]);

        let runner =
            PipelineRunner::new(three_phases(), client.clone(), zero_wait_policy(), "large")
                .unwrap();
        let outcome = runner.run().await;

        assert!(outcome.is_completed());
        assert_eq!(
            outcome.store.pairs(),
            vec![
                ("theme".to_string(), "THEME_OUT".to_string()),
                ("schedule".to_string(), "SCHEDULE_OUT".to_string()),
                ("budget".to_string(), "BUDGET_OUT".to_string()),
            ]
        );

        // Insertion sequence matches declared order
        let seqs: Vec<u64> = outcome.store.snapshot().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_phases() {
        let client = Arc::new(MockCompletionClient::new());
        client.add_replies(vec![
            MockReply::text("THEME_OUT"),
            MockReply::permanent("rejected"),
        ]);

        let runner =
            PipelineRunner::new(three_phases(), client.clone(), zero_wait_policy(), "large")
                .unwrap();
        let outcome = runner.run().await;

        match &outcome.state {
            RunState::Failed { phase_id, kind } => {
                assert_eq!(phase_id, "schedule");
                assert_eq!(*kind, FailureKind::Permanent);
            }
            other => panic!("expected failed state, got {other:?}"),
        }

        // Completed outputs preserved; later phases never ran
        assert!(outcome.store.contains("theme"));
        assert!(!outcome.store.contains("schedule"));
        assert!(!outcome.store.contains("budget"));
        assert_eq!(client.call_count(), 2);
        assert_eq!(outcome.summary.executed_ids(), vec!["theme"]);
        assert_eq!(
            outcome.summary.failure.as_ref().unwrap().phase_id,
            "schedule"
        );
    }

    #[tokio::test]
    async fn test_cancellation_between_phases() {
        let client = Arc::new(MockCompletionClient::new());
        let runner =
            PipelineRunner::new(three_phases(), client.clone(), zero_wait_policy(), "large")
                .unwrap();

        let token = runner.cancel_token();
        token.cancel();

        let outcome = runner.run().await;

        match &outcome.state {
            RunState::Failed { phase_id, kind } => {
                assert_eq!(phase_id, "theme");
                assert_eq!(*kind, FailureKind::Cancelled);
            }
            other => panic!("expected cancelled failure, got {other:?}"),
        }
        assert_eq!(client.call_count(), 0);
        assert!(outcome.store.is_empty());
    }

    #[tokio::test]
    async fn test_run_state_terminal_checks() {
        assert!(!RunState::Pending.is_terminal());
        assert!(!RunState::Running {
            phase_id: "x".to_string()
        }
        .is_terminal());
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Failed {
            phase_id: "x".to_string(),
            kind: FailureKind::Transient
        }
        .is_terminal());
    }
}
