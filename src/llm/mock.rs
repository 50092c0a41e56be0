use super::client::CompletionClient;
use super::error::BackendError;
use super::types::{CompletionRequest, CompletionResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Scripted completion client for tests.
///
/// Replies are served in FIFO order regardless of the request, and every
/// request is recorded so tests can assert on prompt contents and the model
/// each attempt was sent to.
pub struct MockCompletionClient {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    name: String,
}

/// One request observed by the mock, in arrival order.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct MockReply {
    pub text: String,
    pub error: Option<BackendError>,
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: None,
        }
    }

    pub fn error(error: BackendError) -> Self {
        Self {
            text: String::new(),
            error: Some(error),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::error(BackendError::NetworkError {
            message: message.into(),
        })
    }

    pub fn rate_limited() -> Self {
        Self::error(BackendError::RateLimitError { retry_after: None })
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::error(BackendError::InvalidResponse {
            message: message.into(),
        })
    }
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            name: "MockCompletion".to_string(),
        }
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            name: name.into(),
        }
    }

    pub fn add_reply(&self, reply: MockReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn add_replies(&self, replies: impl IntoIterator<Item = MockReply>) {
        let mut queue = self.replies.lock().unwrap();
        for reply in replies {
            queue.push_back(reply);
        }
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    /// Every request observed so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for MockCompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| BackendError::Other {
                message: "MockCompletionClient: no more replies in queue".to_string(),
            })?;

        if let Some(error) = reply.error {
            return Err(error);
        }

        Ok(CompletionResponse::text(reply.text, Duration::from_millis(10)))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model_info(&self) -> Option<String> {
        Some("mock-model".to_string())
    }
}

impl std::fmt::Debug for MockCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCompletionClient")
            .field("name", &self.name)
            .field("remaining_replies", &self.remaining_replies())
            .field("call_count", &self.call_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_basic() {
        let client = MockCompletionClient::new();
        client.add_reply(MockReply::text("Hello!"));

        let response = client
            .complete(CompletionRequest::new("hi", "test-model"))
            .await
            .unwrap();

        assert_eq!(response.text, "Hello!");
        assert_eq!(client.call_count(), 1);
        assert_eq!(client.requests()[0].model, "test-model");
    }

    #[tokio::test]
    async fn test_mock_client_error() {
        let client = MockCompletionClient::new();
        client.add_reply(MockReply::rate_limited());

        let result = client
            .complete(CompletionRequest::new("hi", "test-model"))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_client_no_replies() {
        let client = MockCompletionClient::new();

        let result = client
            .complete(CompletionRequest::new("hi", "test-model"))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_client_reply_sequence() {
        let client = MockCompletionClient::new();
        client.add_replies(vec![
            MockReply::text("First"),
            MockReply::text("Second"),
            MockReply::text("Third"),
        ]);

        assert_eq!(client.remaining_replies(), 3);

        let r1 = client
            .complete(CompletionRequest::new("a", "m"))
            .await
            .unwrap();
        assert_eq!(r1.text, "First");

        let r2 = client
            .complete(CompletionRequest::new("b", "m"))
            .await
            .unwrap();
        assert_eq!(r2.text, "Second");

        assert_eq!(client.remaining_replies(), 1);
    }

    #[tokio::test]
    async fn test_recorded_prompts() {
        let client = MockCompletionClient::new();
        client.add_replies(vec![MockReply::text("one"), MockReply::text("two")]);

        client
            .complete(CompletionRequest::new("first prompt", "large"))
            .await
            .unwrap();
        client
            .complete(CompletionRequest::new("second prompt", "small"))
            .await
            .unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].prompt, "first prompt");
        assert_eq!(requests[1].model, "small");
    }

    #[test]
    fn test_custom_name() {
        let client = MockCompletionClient::with_name("TestClient");
        assert_eq!(client.name(), "TestClient");
    }
}
