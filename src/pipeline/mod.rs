pub mod definition;
pub mod error;
pub mod executor;
pub mod phase;
pub mod policy;
pub mod runner;
pub mod store;

pub use definition::{DefinitionError, PipelineDefinition};
pub use error::{FailureKind, PhaseFailure, PipelineError, StoreError};
pub use executor::{PhaseExecutor, PhaseOutcome};
pub use phase::{ContextSelector, PhaseSpec};
pub use policy::ExecutionPolicy;
pub use runner::{
    validate_phases, CancelToken, PipelineRunner, RunOutcome, RunState, RunSummary,
};
pub use store::{ContextEntry, ContextStore};
