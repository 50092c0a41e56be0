//! Pipeline error taxonomy

use crate::llm::ErrorClass;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use super::store::StoreError;

/// Terminal reason a phase gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Transient failures exhausted the attempt budget
    Transient,
    /// Rate-limited and the fallback (if any) did not rescue the phase
    RateLimited,
    /// Unrecoverable backend rejection; never retried
    Permanent,
    /// The run was cancelled at a phase boundary
    Cancelled,
}

impl From<ErrorClass> for FailureKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::Transient => FailureKind::Transient,
            ErrorClass::RateLimited => FailureKind::RateLimited,
            ErrorClass::Permanent => FailureKind::Permanent,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transient => write!(f, "transient"),
            FailureKind::RateLimited => write!(f, "rate_limited"),
            FailureKind::Permanent => write!(f, "permanent"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A phase exhausted its retry/fallback budget.
///
/// Surfaced to the runner, which aborts the remaining phases. The store is
/// left unmodified for the failing phase.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("Phase '{phase_id}' failed ({kind}) after {attempts} attempt(s): {message}")]
pub struct PhaseFailure {
    /// Id of the failing phase
    pub phase_id: String,
    /// Terminal error kind
    pub kind: FailureKind,
    /// Completion attempts made, fallback included
    pub attempts: usize,
    /// Human-readable description of the terminal error
    pub message: String,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Duplicate phase ids, empty phase list, or a malformed selector
    /// reference. Detected before any backend call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A phase exhausted retries/fallback; remaining phases were aborted.
    #[error(transparent)]
    Phase(#[from] PhaseFailure),

    /// Context store misuse; indicates a wiring bug, always fatal.
    #[error(transparent)]
    Store(#[from] StoreError),
}
