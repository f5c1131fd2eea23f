//! LLM Backend trait and implementations.
//!
//! This module defines the abstraction layer for chat-completion providers
//! and provides a mock implementation for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LlmError, Result, is_retryable};
use crate::types::{CompletionRequest, CompletionResponse, StopReason, Usage};

// ─────────────────────────────────────────────────────────────────────────────
// Shared Retry Logic
// ─────────────────────────────────────────────────────────────────────────────

/// Execute an async operation with exponential backoff retry.
///
/// Retries only on transient errors (network failures, rate limits). A
/// provider-supplied `Retry-After` takes precedence over the backoff.
/// Non-retryable errors are returned immediately.
pub async fn with_retry<F, Fut, T>(
    max_retries: u32,
    initial_backoff: Duration,
    backend_name: &str,
    mut f: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut backoff = initial_backoff;
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if !is_retryable(&e) || attempt >= max_retries => return Err(e),
            Err(e) => {
                let wait = e.retry_after().unwrap_or(backoff);
                attempt += 1;
                tracing::warn!(
                    backend = backend_name,
                    attempt = attempt,
                    max_retries = max_retries,
                    backoff_ms = wait.as_millis() as u64,
                    error = %e,
                    "Request failed, retrying"
                );
                tokio::time::sleep(wait).await;
                backoff *= 2;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for chat-completion providers.
///
/// Implementations provide the actual connection to an LLM service, e.g.
/// OpenAI or any OpenAI-compatible endpoint.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Execute a completion request and return the full response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the name of this backend.
    fn name(&self) -> &str;
}

/// A backend that can be shared across threads.
pub type SharedBackend = Arc<dyn LlmBackend>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Backend
// ─────────────────────────────────────────────────────────────────────────────

/// A canned reply for [`MockBackend`].
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Reply with this text.
    Text(String),
    /// Fail with a backend error carrying this message.
    Error(String),
}

type Responder = Box<dyn Fn(&CompletionRequest) -> MockResponse + Send + Sync>;

enum Replies {
    Queue(Vec<MockResponse>),
    Responder(Responder),
}

/// A mock backend for testing purposes.
///
/// Either replays pre-configured responses in order, or computes each reply
/// from the request. The latter is deterministic even when requests arrive
/// concurrently.
pub struct MockBackend {
    name: String,
    replies: Mutex<Replies>,
    request_log: Mutex<Vec<CompletionRequest>>,
}

impl MockBackend {
    /// Create a mock backend that replays `responses` in order.
    ///
    /// If more requests are made than responses available, an error is returned.
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            name: "mock".to_string(),
            replies: Mutex::new(Replies::Queue(responses)),
            request_log: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock backend with a single text response.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(vec![MockResponse::Text(text.into())])
    }

    /// Create a mock backend that answers every request with `responder`.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> MockResponse + Send + Sync + 'static,
    {
        Self {
            name: "mock".to_string(),
            replies: Mutex::new(Replies::Responder(Box::new(responder))),
            request_log: Mutex::new(Vec::new()),
        }
    }

    /// Get all requests that were made to this backend.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.request_log.lock().clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.request_log.lock().len()
    }
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("name", &self.name)
            .field("requests", &self.request_count())
            .finish()
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let reply = {
            let mut replies = self.replies.lock();
            match &mut *replies {
                Replies::Queue(queue) if queue.is_empty() => None,
                Replies::Queue(queue) => Some(queue.remove(0)),
                Replies::Responder(responder) => Some(responder(&request)),
            }
        };
        let model = request.model.clone();
        self.request_log.lock().push(request);

        match reply {
            None => Err(LlmError::Backend(
                "MockBackend: no more responses available".to_string(),
            )),
            Some(MockResponse::Error(message)) => Err(LlmError::Backend(message)),
            Some(MockResponse::Text(text)) => {
                let id = format!("mock_msg_{}", self.request_count());
                Ok(CompletionResponse::new(
                    id,
                    model,
                    text,
                    StopReason::EndTurn,
                    Usage::new(10, 20),
                ))
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
