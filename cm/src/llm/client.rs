//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is independent (fresh context)
///
/// Every request carries its own system prompt and messages; nothing is
/// remembered between calls. Implementations must be cheap to share behind
/// an `Arc` because the router hands the same client to every caller.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Model identifier this client talks to (for display and logging)
    fn model(&self) -> &str;

    /// Send a single completion request and wait for the full response
    ///
    /// Dropping the returned future cancels the in-flight HTTP request.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    /// One scripted reply
    #[derive(Debug, Clone)]
    pub enum MockReply {
        /// Successful text completion
        Text(String),
        /// Successful completion with no text content
        Empty,
        /// Backend-side failure
        Fail { status: u16, message: String },
    }

    impl MockReply {
        pub fn text(s: impl Into<String>) -> Self {
            MockReply::Text(s.into())
        }

        pub fn fail(message: impl Into<String>) -> Self {
            MockReply::Fail {
                status: 500,
                message: message.into(),
            }
        }
    }

    /// Mock LLM client for unit tests
    pub struct MockLlmClient {
        replies: Vec<MockReply>,
        call_count: AtomicUsize,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockLlmClient {
        pub fn new(replies: Vec<MockReply>) -> Self {
            debug!(reply_count = %replies.len(), "MockLlmClient::new: called");
            Self {
                replies,
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// A client whose every call fails
        pub fn failing() -> Self {
            Self::new(vec![])
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Requests received so far, in call order
        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().expect("mock lock poisoned").clone()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        fn model(&self) -> &str {
            "mock"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            debug!("MockLlmClient::complete: called");
            self.requests.lock().expect("mock lock poisoned").push(request);
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            match self.replies.get(idx).cloned() {
                Some(MockReply::Text(text)) => Ok(CompletionResponse::text(text)),
                Some(MockReply::Empty) => Ok(CompletionResponse {
                    content: None,
                    ..CompletionResponse::text("")
                }),
                Some(MockReply::Fail { status, message }) => Err(LlmError::ApiError { status, message }),
                None => {
                    debug!("MockLlmClient::complete: no more mock responses");
                    Err(LlmError::InvalidResponse("No more mock responses".to_string()))
                }
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_client_returns_replies_in_order() {
            let client = MockLlmClient::new(vec![MockReply::text("Response 1"), MockReply::fail("boom")]);
            let req = CompletionRequest::single_turn("hi", None, 100);

            let resp1 = client.complete(req.clone()).await.unwrap();
            assert_eq!(resp1.content, Some("Response 1".to_string()));

            let resp2 = client.complete(req).await;
            assert!(matches!(resp2, Err(LlmError::ApiError { status: 500, .. })));

            assert_eq!(client.call_count(), 2);
            assert_eq!(client.requests().len(), 2);
        }

        #[tokio::test]
        async fn test_mock_client_errors_when_exhausted() {
            let client = MockLlmClient::failing();
            let result = client.complete(CompletionRequest::single_turn("hi", None, 100)).await;
            assert!(result.is_err());
        }
    }
}
