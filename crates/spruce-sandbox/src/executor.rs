//! Code executor trait and a mock implementation.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{SandboxError, SandboxResult};
use crate::types::{ExecutionOutput, ExecutionRequest, RunOutput};

/// Runs programs in an isolated environment.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Run the request to completion and return its output.
    ///
    /// A program that exits non-zero is still `Ok`; only transport and
    /// sandbox failures are errors.
    async fn execute(&self, request: ExecutionRequest) -> SandboxResult<ExecutionOutput>;

    /// Get the name of this executor.
    fn name(&self) -> &str;
}

/// An executor that can be shared across tasks.
pub type SharedExecutor = Arc<dyn CodeExecutor>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Executor
// ─────────────────────────────────────────────────────────────────────────────

type Responder = Box<dyn Fn(&ExecutionRequest) -> SandboxResult<ExecutionOutput> + Send + Sync>;

enum Replies {
    Queue(VecDeque<SandboxResult<ExecutionOutput>>),
    Responder(Responder),
}

/// A mock executor for tests.
///
/// Records every request and replies from a queue or a closure.
pub struct MockExecutor {
    replies: Mutex<Replies>,
    requests: Mutex<Vec<ExecutionRequest>>,
}

impl MockExecutor {
    /// Replay `results` in order; errors once they run out.
    pub fn new(results: Vec<SandboxResult<ExecutionOutput>>) -> Self {
        Self {
            replies: Mutex::new(Replies::Queue(results.into())),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A single clean run printing `stdout`.
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self::new(vec![Ok(ExecutionOutput::new(
            "python",
            "3.10.0",
            RunOutput::success(stdout),
        ))])
    }

    /// Compute each reply from the request.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&ExecutionRequest) -> SandboxResult<ExecutionOutput> + Send + Sync + 'static,
    {
        Self {
            replies: Mutex::new(Replies::Responder(Box::new(responder))),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<ExecutionRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl std::fmt::Debug for MockExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockExecutor")
            .field("requests", &self.request_count())
            .finish()
    }
}

#[async_trait]
impl CodeExecutor for MockExecutor {
    async fn execute(&self, request: ExecutionRequest) -> SandboxResult<ExecutionOutput> {
        let reply = match &mut *self.replies.lock() {
            Replies::Queue(queue) => queue.pop_front().unwrap_or_else(|| {
                Err(SandboxError::InvalidResponse(
                    "MockExecutor: no more results available".to_string(),
                ))
            }),
            Replies::Responder(responder) => responder(&request),
        };
        self.requests.lock().push(request);
        reply
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_mock_replays_in_order() {
        let executor = MockExecutor::new(vec![
            Ok(ExecutionOutput::new("python", "3.10.0", RunOutput::success("one"))),
            Err(SandboxError::Timeout(Duration::from_secs(3))),
        ]);

        let first = executor
            .execute(ExecutionRequest::new("python", "print('one')"))
            .await
            .unwrap();
        assert_eq!(first.run.stdout, "one");

        let second = executor
            .execute(ExecutionRequest::new("python", "while True: pass"))
            .await;
        assert!(matches!(second, Err(SandboxError::Timeout(_))));

        let third = executor.execute(ExecutionRequest::new("python", "")).await;
        assert!(matches!(third, Err(SandboxError::InvalidResponse(_))));

        let sources: Vec<_> = executor
            .requests()
            .iter()
            .map(|r| r.source().to_string())
            .collect();
        assert_eq!(sources, vec!["print('one')", "while True: pass", ""]);
    }

    #[tokio::test]
    async fn test_mock_from_fn() {
        let executor = MockExecutor::from_fn(|request| {
            Ok(ExecutionOutput::new(
                request.language.clone(),
                "1.0",
                RunOutput::success(request.source().len().to_string()),
            ))
        });

        let output = executor
            .execute(ExecutionRequest::new("python", "abc"))
            .await
            .unwrap();
        assert_eq!(output.run.stdout, "3");
        assert_eq!(executor.request_count(), 1);
    }
}
