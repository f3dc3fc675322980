//! Mock AI Provider for testing.
//!
//! Provides a scripted implementation of the AIProvider port, allowing
//! tests to drive the streaming pipeline without calling real AI APIs.
//!
//! # Features
//!
//! - Scripted delta sequences, replayed chunk by chunk
//! - Error injection before the stream starts or part-way through it
//! - Streams that never end, for cancellation tests
//! - Simulated per-chunk delays
//! - Call tracking for verification
//! - Counting streams dropped by the consumer
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_deltas(["Hi", "```json", "{\"reply\":\"ok\"}", "```"]);
//!
//! let stream = provider.stream_complete(request).await?;
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, ChunkStream, CompletionRequest, FinishReason, ProviderInfo, StreamChunk,
};

/// Mock AI provider for testing.
///
/// Configurable to replay specific deltas, simulate delays, or inject errors.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Scripted responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Provider info to return.
    info: ProviderInfo,
    /// Simulated latency before each chunk.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
    /// Number of returned streams that have been dropped.
    dropped: Arc<AtomicUsize>,
}

/// A scripted mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Stream the deltas, then end as described.
    Stream {
        deltas: Vec<String>,
        ending: MockEnding,
    },
    /// Fail the call before any chunk is produced.
    Error(MockError),
}

/// How a scripted stream ends.
#[derive(Debug, Clone)]
pub enum MockEnding {
    /// Final chunk with the given finish reason.
    Finish(FinishReason),
    /// The stream yields an error.
    Fail(MockError),
    /// The stream never ends.
    Hang,
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    /// Simulate rate limiting.
    RateLimited { retry_after_secs: u32 },
    /// Simulate provider unavailable.
    Unavailable { message: String },
    /// Simulate authentication failure.
    AuthenticationFailed,
    /// Simulate network error.
    Network { message: String },
    /// Simulate timeout.
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1"),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
            dropped: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Adds a response streamed as a single delta.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.with_deltas([content.into()])
    }

    /// Adds a response streamed as the given deltas, ending normally.
    pub fn with_deltas<I, S>(self, deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(MockResponse::Stream {
            deltas: deltas.into_iter().map(Into::into).collect(),
            ending: MockEnding::Finish(FinishReason::Stop),
        })
    }

    /// Adds a response that streams the deltas and then fails.
    pub fn with_failing_stream<I, S>(self, deltas: I, error: MockError) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(MockResponse::Stream {
            deltas: deltas.into_iter().map(Into::into).collect(),
            ending: MockEnding::Fail(error),
        })
    }

    /// Adds a response that streams the deltas and never finishes.
    pub fn with_hanging_stream<I, S>(self, deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(MockResponse::Stream {
            deltas: deltas.into_iter().map(Into::into).collect(),
            ending: MockEnding::Hang,
        })
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(MockResponse::Error(error))
    }

    /// Sets simulated latency before each chunk.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the provider info.
    pub fn with_provider_info(mut self, info: ProviderInfo) -> Self {
        self.info = info;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns how many returned streams have been dropped so far.
    pub fn dropped_streams(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    fn push(self, response: MockResponse) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Gets the next response or a default.
    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockResponse::Stream {
                deltas: vec!["Mock response".to_string()],
                ending: MockEnding::Finish(FinishReason::Stop),
            })
    }
}

/// Bumps the dropped-stream counter when the stream owning it goes away.
#[derive(Debug)]
struct DropSignal(Arc<AtomicUsize>);

impl Drop for DropSignal {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        self.calls.lock().unwrap().push(request);

        let (deltas, ending) = match self.next_response() {
            MockResponse::Stream { deltas, ending } => (deltas, ending),
            MockResponse::Error(err) => return Err(err.into()),
        };

        let mut items: Vec<Result<StreamChunk, AIError>> =
            deltas.into_iter().map(|d| Ok(StreamChunk::content(d))).collect();
        let hang = match ending {
            MockEnding::Finish(reason) => {
                items.push(Ok(StreamChunk::finished(reason)));
                false
            }
            MockEnding::Fail(err) => {
                items.push(Err(err.into()));
                false
            }
            MockEnding::Hang => true,
        };

        let delay = self.delay;
        let signal = DropSignal(Arc::clone(&self.dropped));
        let chunks = stream::iter(items).then(move |item| {
            let _ = &signal;
            async move {
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                item
            }
        });

        if hang {
            Ok(Box::pin(chunks.chain(stream::pending())))
        } else {
            Ok(Box::pin(chunks))
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
