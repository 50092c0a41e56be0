//! Single-phase execution: prompt assembly, truncation, retry, fallback
//!
//! The executor is the only writer of the context store, and the completion
//! client is its only side-effect channel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::{CompletionClient, CompletionRequest, ErrorClass};

use super::error::{PhaseFailure, PipelineError};
use super::phase::PhaseSpec;
use super::policy::ExecutionPolicy;
use super::store::{ContextEntry, ContextStore};

/// What happened while executing one phase; feeds the run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOutcome {
    /// Phase id
    pub id: String,
    /// Completion attempts made, fallback included
    pub attempts: usize,
    /// Transient retries among those attempts
    pub retries: usize,
    /// Context was dropped to fit the prompt budget
    pub truncated: bool,
    /// The fallback model answered instead of the primary
    pub used_fallback: bool,
    /// Model that produced the accepted output
    pub model: String,
    /// Wall-clock time spent on the phase
    #[serde(skip)]
    pub duration: Duration,
}

pub struct PhaseExecutor {
    client: Arc<dyn CompletionClient>,
    policy: ExecutionPolicy,
    model: String,
}

impl PhaseExecutor {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        policy: ExecutionPolicy,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            policy,
            model: model.into(),
        }
    }

    /// Runs one phase to completion or terminal failure.
    ///
    /// On success the phase output is written to the store exactly once; on
    /// failure the store is left untouched for this phase.
    pub async fn execute(
        &self,
        spec: &PhaseSpec,
        store: &mut ContextStore,
    ) -> Result<PhaseOutcome, PipelineError> {
        let start = Instant::now();

        let snapshot = store.snapshot();
        let selected = spec.selector.select(&snapshot);
        let (prompt, truncated) = self.assemble_prompt(spec, selected);

        if truncated {
            warn!(
                phase = %spec.id,
                budget = self.policy.max_prompt_chars,
                "Prompt over budget, dropped oldest context"
            );
        }

        let mut attempts = 0;
        let mut retries = 0;
        let mut used_fallback = false;
        let mut model = self.model.clone();

        loop {
            attempts += 1;
            debug!(
                phase = %spec.id,
                attempt = attempts,
                model = %model,
                "Requesting completion"
            );

            let mut request = CompletionRequest::new(prompt.clone(), model.clone())
                .with_timeout(self.policy.request_timeout);
            if let Some(max_tokens) = self.policy.max_tokens {
                request = request.with_max_tokens(max_tokens);
            }

            let error = match self.client.complete(request).await {
                Ok(response) => {
                    store.put(&spec.id, response.text)?;
                    return Ok(PhaseOutcome {
                        id: spec.id.clone(),
                        attempts,
                        retries,
                        truncated,
                        used_fallback,
                        model,
                        duration: start.elapsed(),
                    });
                }
                Err(error) => error,
            };

            let class = error.class();

            // One fallback attempt is the whole rescue budget; after it, any
            // failure is terminal.
            if used_fallback {
                return Err(self.fail(spec, class, attempts, &error.to_string()));
            }

            match class {
                ErrorClass::Transient if attempts < self.policy.max_attempts => {
                    let backoff = self.policy.backoff_for(attempts);
                    warn!(
                        phase = %spec.id,
                        attempt = attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %error,
                        "Transient backend failure, retrying"
                    );
                    retries += 1;
                    tokio::time::sleep(backoff).await;
                }
                ErrorClass::RateLimited => match self.policy.fallback_model.clone() {
                    Some(fallback) => {
                        warn!(
                            phase = %spec.id,
                            primary = %model,
                            fallback = %fallback,
                            "Rate limited, retrying once against fallback model"
                        );
                        used_fallback = true;
                        model = fallback;
                    }
                    None => {
                        return Err(self.fail(spec, class, attempts, &error.to_string()));
                    }
                },
                _ => {
                    return Err(self.fail(spec, class, attempts, &error.to_string()));
                }
            }
        }
    }

    /// Builds the phase prompt: persona first, selected context after.
    ///
    /// When the assembled prompt exceeds the character budget, whole context
    /// entries are dropped oldest-first; a lone oversized entry is trimmed
    /// from the front so the most recent text survives. The persona is never
    /// shortened.
    fn assemble_prompt(&self, spec: &PhaseSpec, mut selected: Vec<ContextEntry>) -> (String, bool) {
        let budget = self.policy.max_prompt_chars;
        let mut truncated = false;

        let mut prompt = render_prompt(&spec.persona, &selected);
        while prompt.chars().count() > budget && selected.len() > 1 {
            selected.remove(0);
            truncated = true;
            prompt = render_prompt(&spec.persona, &selected);
        }

        if prompt.chars().count() > budget && selected.len() == 1 {
            let overflow = prompt.chars().count() - budget;
            let entry = &mut selected[0];
            let kept: String = entry
                .output
                .chars()
                .skip(overflow.min(entry.output.chars().count()))
                .collect();
            entry.output = kept;
            truncated = true;
            prompt = render_prompt(&spec.persona, &selected);
        }

        (prompt, truncated)
    }

    fn fail(
        &self,
        spec: &PhaseSpec,
        class: ErrorClass,
        attempts: usize,
        message: &str,
    ) -> PipelineError {
        PipelineError::Phase(PhaseFailure {
            phase_id: spec.id.clone(),
            kind: class.into(),
            attempts,
            message: message.to_string(),
        })
    }
}

fn render_prompt(persona: &str, selected: &[ContextEntry]) -> String {
    if selected.is_empty() {
        return persona.to_string();
    }

    let mut sections = Vec::with_capacity(selected.len() + 1);
    sections.push(persona.to_string());
    for entry in selected {
        sections.push(format!("## {}\n{}", entry.id, entry.output));
    }
    sections.join("\n\n")
}
