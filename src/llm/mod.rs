//! Completion client abstraction layer
//!
//! This module provides a trait-based abstraction for text-completion
//! backends, allowing the GenAI-backed client and the scripted mock to be
//! used interchangeably by the pipeline.

mod client;
mod error;
mod genai;
mod mock;
mod types;

pub use client::CompletionClient;
pub use error::{BackendError, ErrorClass};
pub use genai::GenAiCompletionClient;
pub use mock::{MockCompletionClient, MockReply, RecordedRequest};
pub use types::{CompletionRequest, CompletionResponse};
