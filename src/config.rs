//! Configuration management for baton
//!
//! Runtime settings load from environment variables with sensible defaults.
//! Configuration covers backend selection, model choices, and the retry/
//! truncation policy handed to the pipeline.
//!
//! # Environment Variables
//!
//! ## Baton Configuration
//! - `BATON_PROVIDER`: Provider selection (ollama|openai|anthropic|gemini|xai|groq) - default: "ollama"
//! - `BATON_MODEL`: Primary model name - provider-specific default
//! - `BATON_FALLBACK_MODEL`: Cheaper model tried once on rate limits - default: unset
//! - `BATON_REQUEST_TIMEOUT`: Per-call deadline in seconds - default: "30"
//! - `BATON_MAX_ATTEMPTS`: Completion attempts per phase - default: "3"
//! - `BATON_INITIAL_BACKOFF_MS`: First retry backoff in milliseconds - default: "500"
//! - `BATON_MAX_PROMPT_CHARS`: Assembled-prompt budget in characters - default: "48000"
//! - `BATON_MAX_TOKENS`: Response length budget - default: unset
//! - `BATON_LOG_LEVEL`: Logging level - default: "info"
//! - `BATON_API_BASE_URL`: Custom endpoint override for the provider
//!
//! ## GenAI Provider Configuration
//! These environment variables are read directly by the genai library:
//! - **Ollama**: `OLLAMA_HOST` (default: http://localhost:11434)
//! - **OpenAI**: `OPENAI_API_KEY` (required)
//! - **Anthropic**: `ANTHROPIC_API_KEY` (required)
//! - **Gemini**: `GOOGLE_API_KEY` (required)
//! - **Xai**: `XAI_API_KEY` (required)
//! - **Groq**: `GROQ_API_KEY` (required)

use crate::llm::{BackendError, CompletionClient, GenAiCompletionClient};
use crate::pipeline::ExecutionPolicy;
use genai::adapter::AdapterKind;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;
const DEFAULT_MAX_PROMPT_CHARS: usize = 48_000;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider: {0}. Valid options: ollama, openai, anthropic, gemini, xai, groq")]
    InvalidProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Backend initialization failed: {0}")]
    BackendInitError(#[from] BackendError),
}

/// Main configuration structure for baton
///
/// Constructed via `Default::default()`, which loads from environment
/// variables with fallback defaults. Provider credentials are read by the
/// genai library's own environment variables.
#[derive(Debug, Clone)]
pub struct BatonConfig {
    /// Completion provider (genai adapter)
    pub provider: AdapterKind,

    /// Primary model used for every phase
    pub model: String,

    /// Smaller/cheaper model tried once when the primary is rate-limited
    pub fallback_model: Option<String>,

    /// Per-call deadline in seconds
    pub request_timeout_secs: u64,

    /// Completion attempts per phase, including the first
    pub max_attempts: usize,

    /// First retry backoff in milliseconds; doubles per retry
    pub initial_backoff_ms: u64,

    /// Assembled-prompt budget in characters
    pub max_prompt_chars: usize,

    /// Response length budget forwarded to the backend
    pub max_tokens: Option<u32>,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for BatonConfig {
    fn default() -> Self {
        let provider = env::var("BATON_PROVIDER")
            .ok()
            .and_then(|s| parse_provider(&s).ok())
            .unwrap_or(AdapterKind::Ollama);

        let model = env::var("BATON_MODEL")
            .ok()
            .unwrap_or_else(|| match provider {
                AdapterKind::Ollama => DEFAULT_OLLAMA_MODEL.to_string(),
                _ => "default-model".to_string(),
            });

        let fallback_model = env::var("BATON_FALLBACK_MODEL").ok();

        let request_timeout_secs = env::var("BATON_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let max_attempts = env::var("BATON_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);

        let initial_backoff_ms = env::var("BATON_INITIAL_BACKOFF_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_INITIAL_BACKOFF_MS);

        let max_prompt_chars = env::var("BATON_MAX_PROMPT_CHARS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_PROMPT_CHARS);

        let max_tokens = env::var("BATON_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok());

        let log_level = env::var("BATON_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            provider,
            model,
            fallback_model,
            request_timeout_secs,
            max_attempts,
            initial_backoff_ms,
            max_prompt_chars,
            max_tokens,
            log_level,
        }
    }
}

impl BatonConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Model name must not be empty".to_string(),
            ));
        }

        if let Some(fallback) = &self.fallback_model {
            if fallback == &self.model {
                return Err(ConfigError::ValidationFailed(
                    "Fallback model must differ from the primary model".to_string(),
                ));
            }
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        if self.max_prompt_chars == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_prompt_chars must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Builds the execution policy handed to the pipeline.
    pub fn policy(&self) -> ExecutionPolicy {
        let mut policy = ExecutionPolicy::new()
            .with_max_attempts(self.max_attempts)
            .with_initial_backoff(Duration::from_millis(self.initial_backoff_ms))
            .with_max_prompt_chars(self.max_prompt_chars)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs));

        if let Some(fallback) = &self.fallback_model {
            policy = policy.with_fallback_model(fallback);
        }
        if let Some(max_tokens) = self.max_tokens {
            policy = policy.with_max_tokens(max_tokens);
        }

        policy
    }

    /// Creates the completion client for the configured provider.
    pub fn create_client(&self) -> Result<Arc<dyn CompletionClient>, ConfigError> {
        let client = GenAiCompletionClient::new(self.provider)?;
        Ok(Arc::new(client))
    }
}

fn parse_provider(s: &str) -> Result<AdapterKind, ConfigError> {
    let lowered = s.to_lowercase();
    // "claude" kept as a familiar alias for the Anthropic adapter
    if lowered == "claude" {
        return Ok(AdapterKind::Anthropic);
    }
    AdapterKind::from_lower_str(&lowered).ok_or_else(|| ConfigError::InvalidProvider(s.to_string()))
}
