use std::time::Duration;

/// Retry, fallback, and truncation knobs for phase execution.
///
/// Expressed as data so tests can inject deterministic zero-wait policies.
#[derive(Debug, Clone)]
pub struct ExecutionPolicy {
    /// Maximum completion attempts per phase, including the first
    pub max_attempts: usize,
    /// Backoff before the first retry; doubles on each subsequent retry
    pub initial_backoff: Duration,
    /// Smaller/cheaper model tried once when the primary is rate-limited
    pub fallback_model: Option<String>,
    /// Assembled-prompt budget in characters; context is truncated
    /// oldest-first to fit, the persona never is
    pub max_prompt_chars: usize,
    /// Per-call deadline handed to the completion client
    pub request_timeout: Duration,
    /// Length budget forwarded to the backend
    pub max_tokens: Option<u32>,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            fallback_model: None,
            max_prompt_chars: 48_000,
            request_timeout: Duration::from_secs(30),
            max_tokens: None,
        }
    }
}

impl ExecutionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn with_fallback_model(mut self, fallback_model: impl Into<String>) -> Self {
        self.fallback_model = Some(fallback_model.into());
        self
    }

    pub fn with_max_prompt_chars(mut self, max_prompt_chars: usize) -> Self {
        self.max_prompt_chars = max_prompt_chars;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Backoff before retrying after the given 1-based attempt.
    pub fn backoff_for(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as u32;
        self.initial_backoff * 2u32.saturating_pow(exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ExecutionPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff, Duration::from_millis(500));
        assert!(policy.fallback_model.is_none());
        assert_eq!(policy.max_prompt_chars, 48_000);
        assert_eq!(policy.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_pattern() {
        let policy = ExecutionPolicy::new()
            .with_max_attempts(5)
            .with_initial_backoff(Duration::from_millis(100))
            .with_fallback_model("small-model")
            .with_max_prompt_chars(1_000)
            .with_request_timeout(Duration::from_secs(60))
            .with_max_tokens(2_048);

        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_backoff, Duration::from_millis(100));
        assert_eq!(policy.fallback_model.as_deref(), Some("small-model"));
        assert_eq!(policy.max_prompt_chars, 1_000);
        assert_eq!(policy.request_timeout, Duration::from_secs(60));
        assert_eq!(policy.max_tokens, Some(2_048));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = ExecutionPolicy::new().with_initial_backoff(Duration::from_millis(100));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(400));
    }

    #[test]
    fn test_zero_backoff_for_tests() {
        let policy = ExecutionPolicy::new().with_initial_backoff(Duration::ZERO);
        assert_eq!(policy.backoff_for(3), Duration::ZERO);
    }
}
