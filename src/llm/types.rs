//! Completion request/response types
//!
//! These types are independent of any specific provider implementation. A
//! request carries the fully assembled prompt plus the model identifier and
//! per-call deadline; the executor decides both.

use std::time::Duration;

/// Request to send to the completion backend
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Fully assembled prompt text (persona plus selected context)
    pub prompt: String,
    /// Model identifier, provider-specific
    pub model: String,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Per-call deadline; exceeding it is classified transient
    pub timeout: Duration,
}

impl CompletionRequest {
    /// Creates a new request with the default 30s deadline
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the maximum tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the per-call deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Response from the completion backend
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated text
    pub text: String,
    /// Time taken for the request
    pub response_time: Duration,
}

impl CompletionResponse {
    /// Creates a new response
    pub fn text(text: impl Into<String>, response_time: Duration) -> Self {
        Self {
            text: text.into(),
            response_time,
        }
    }
}
