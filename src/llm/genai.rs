//! GenAI-based completion client implementation
//!
//! This module provides a completion client backed by the `genai` crate,
//! supporting multiple providers (Ollama, OpenAI, Claude, Gemini, Grok, Groq).
//! The model identifier is taken from each request, so the same client serves
//! both the primary and the fallback model of a pipeline run.

use super::client::CompletionClient;
use super::error::BackendError;
use super::types::{CompletionRequest, CompletionResponse};
use async_trait::async_trait;
use genai::adapter::AdapterKind;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{Client, ServiceTarget};
use tracing::{debug, error};

/// GenAI-based completion client supporting multiple providers
pub struct GenAiCompletionClient {
    /// GenAI client instance
    client: Client,
    /// Provider type
    provider: AdapterKind,
}

impl GenAiCompletionClient {
    /// Creates a new GenAI client for the given provider.
    ///
    /// Honors `BATON_API_BASE_URL` as a custom endpoint override; credentials
    /// are read from the provider's standard environment variable.
    pub fn new(provider: AdapterKind) -> Result<Self, BackendError> {
        let custom_endpoint = std::env::var("BATON_API_BASE_URL").ok();

        let client = if let Some(endpoint_url) = custom_endpoint {
            debug!(
                "Using custom endpoint for {}: {}",
                provider.as_str(),
                endpoint_url
            );

            let provider_clone = provider;

            let resolver = ServiceTargetResolver::from_resolver_fn(
                move |service_target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error>
                {
                    let endpoint = Endpoint::from_owned(endpoint_url.clone());

                    let auth = match provider_clone.default_key_env_name() {
                        Some(api_key_var) => AuthData::from_env(api_key_var),
                        None => AuthData::from_single(""),
                    };

                    Ok(ServiceTarget {
                        endpoint,
                        auth,
                        model: service_target.model,
                    })
                },
            );

            Client::builder()
                .with_service_target_resolver(resolver)
                .build()
        } else {
            Client::default()
        };

        debug!("Creating GenAI client: provider={}", provider.as_str());

        Ok(Self { client, provider })
    }

    /// Maps a genai error message onto our taxonomy.
    ///
    /// genai does not expose status codes uniformly across providers, so the
    /// rate-limit and auth cases are recognized from the message text.
    fn map_error(&self, error: impl std::fmt::Display) -> BackendError {
        let message = error.to_string();
        let lowered = message.to_lowercase();

        if lowered.contains("429") || lowered.contains("rate limit") || lowered.contains("quota") {
            return BackendError::RateLimitError { retry_after: None };
        }
        if lowered.contains("401")
            || lowered.contains("403")
            || lowered.contains("unauthorized")
            || lowered.contains("api key")
        {
            return BackendError::AuthenticationError { message };
        }
        if lowered.contains("connection") || lowered.contains("connect error") {
            return BackendError::NetworkError { message };
        }

        BackendError::ApiError {
            message: format!("{} request failed: {}", self.provider.as_str(), message),
            status_code: None,
        }
    }
}

#[async_trait]
impl CompletionClient for GenAiCompletionClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        let start = std::time::Instant::now();

        let chat_request = ChatRequest::new(vec![ChatMessage::user(&request.prompt)]);

        let mut options = ChatOptions::default();
        if let Some(max_tokens) = request.max_tokens {
            options = options.with_max_tokens(max_tokens);
        }

        let response = match tokio::time::timeout(
            request.timeout,
            self.client
                .exec_chat(&request.model, chat_request, Some(&options)),
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                error!("{} API error: {}", self.provider.as_str(), e);
                return Err(self.map_error(e));
            }
            Err(_) => {
                error!(
                    "{} request timed out after {}s",
                    self.provider.as_str(),
                    request.timeout.as_secs()
                );
                return Err(BackendError::TimeoutError {
                    seconds: request.timeout.as_secs(),
                });
            }
        };

        let text = response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| BackendError::InvalidResponse {
                message: "completion contained no text content".to_string(),
            })?;

        Ok(CompletionResponse::text(text, start.elapsed()))
    }

    fn name(&self) -> &str {
        self.provider.as_str()
    }
}

impl std::fmt::Debug for GenAiCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAiCompletionClient")
            .field("provider", &self.provider)
            .finish()
    }
}
