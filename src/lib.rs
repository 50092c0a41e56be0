//! baton - sequential multi-phase LLM pipeline orchestrator
//!
//! This library drives a fixed roster of persona-bound phases through an
//! ordered pipeline against a text-completion backend. Each phase's output
//! is accumulated in a per-run context store and becomes input context for
//! every later phase; the final store is persisted as an ordered report.
//!
//! # Core Concepts
//!
//! - **Phase**: one stage of the pipeline, described by a stable id, opaque
//!   persona text, and a context-selection rule; produces exactly one named
//!   output
//! - **Context store**: insertion-ordered accumulation of phase outputs,
//!   created fresh per run and written exactly once per phase
//! - **Completion client**: pluggable backend boundary (GenAI providers or a
//!   scripted mock) with failures classified transient / rate-limited /
//!   permanent to drive retry and fallback
//!
//! # Example Usage
//!
//! ```ignore
//! use baton::llm::GenAiCompletionClient;
//! use baton::pipeline::{ExecutionPolicy, PhaseSpec, PipelineRunner};
//! use baton::report::Report;
//! use genai::adapter::AdapterKind;
//! use std::sync::Arc;
//!
//! async fn plan_conference() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(GenAiCompletionClient::new(AdapterKind::OpenAI)?);
//!     let phases = vec![
//!         PhaseSpec::new("theme", "You are a conference theme strategist..."),
//!         PhaseSpec::new("schedule", "You are a schedule planner..."),
//!         PhaseSpec::new("budget", "You are a budget analyst..."),
//!     ];
//!
//!     let runner = PipelineRunner::new(phases, client, ExecutionPolicy::default(), "gpt-4o")?;
//!     let outcome = runner.run().await;
//!
//!     let report = Report::from_outcome(&outcome);
//!     println!("{}", report.render_text());
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`llm`]: completion client boundary and error classification
//! - [`pipeline`]: phase specs, context store, executor, runner
//! - [`report`]: durable run artifacts

// Public modules
pub mod cli;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod util;

// Re-export key types for convenient access
pub use config::{BatonConfig, ConfigError};
pub use llm::{
    BackendError, CompletionClient, CompletionRequest, CompletionResponse, ErrorClass,
    GenAiCompletionClient, MockCompletionClient, MockReply,
};
pub use pipeline::{
    ContextEntry, ContextSelector, ContextStore, ExecutionPolicy, FailureKind, PhaseFailure,
    PhaseOutcome, PhaseSpec, PipelineDefinition, PipelineError, PipelineRunner, RunOutcome,
    RunState, RunSummary,
};
pub use report::{Report, ReportFormat, ReportWriter};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_baton() {
        assert_eq!(NAME, "baton");
    }
}
