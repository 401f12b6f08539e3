//! Deterministic provider adapter for tests and local development.
//!
//! `MockAdapter` serves queued replies in order, can fail on demand, can
//! simulate latency, and streams each reply word by word.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       MockAdapter                         │
//! ├───────────────────────────────────────────────────────────┤
//! │  add_response() / add_failure()   queued replies          │
//! │  failing()                        fail when queue empty   │
//! │  with_delay()                     sleep before answering  │
//! │  with_streaming()                 enable generate_stream  │
//! │  with_stream_error_after()        fail mid-stream         │
//! │  call_count() / requests()        inspection              │
//! └───────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{LlmError, Result};
use crate::tokenizer::{estimate_text_tokens, estimate_tokens};
use crate::traits::{ProviderAdapter, ProviderChunk};
use crate::types::{FinishReason, GenerationRequest, GenerationResponse, Usage};

/// Default reply when the queue is empty.
pub const DEFAULT_MOCK_RESPONSE: &str = "Mock response";

/// Failure a mock can be told to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    Api(String),
    RateLimited,
    Network(String),
    Auth,
    Timeout,
}

impl MockFailure {
    pub fn to_error(&self) -> LlmError {
        match self {
            Self::Api(msg) => LlmError::ApiError(msg.clone()),
            Self::RateLimited => LlmError::RateLimited("quota exhausted".into()),
            Self::Network(msg) => LlmError::NetworkError(msg.clone()),
            Self::Auth => LlmError::AuthError("invalid api key".into()),
            Self::Timeout => LlmError::Timeout,
        }
    }
}

type Reply = std::result::Result<String, MockFailure>;

/// Decrements the open-stream counter when the stream is dropped.
struct StreamGuard(Arc<AtomicUsize>);

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scriptable [`ProviderAdapter`].
#[derive(Debug, Clone)]
pub struct MockAdapter {
    name: String,
    replies: Arc<Mutex<VecDeque<Reply>>>,
    failure: Option<MockFailure>,
    delay: Option<Duration>,
    usage: Option<Usage>,
    streaming: bool,
    stream_error_after: Option<usize>,
    call_count: Arc<AtomicUsize>,
    open_streams: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockAdapter {
    /// Create a mock serving provider id `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: Arc::new(Mutex::new(VecDeque::new())),
            failure: None,
            delay: None,
            usage: None,
            streaming: false,
            stream_error_after: None,
            call_count: Arc::new(AtomicUsize::new(0)),
            open_streams: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail every call that finds the reply queue empty.
    pub fn failing(mut self, failure: MockFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report fixed usage instead of estimating it.
    pub fn with_usage(mut self, prompt_tokens: usize, completion_tokens: usize) -> Self {
        self.usage = Some(Usage::new(prompt_tokens, completion_tokens));
        self
    }

    /// Enable or disable streaming support.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Yield a network error after `deltas` chunks.
    pub fn with_stream_error_after(mut self, deltas: usize) -> Self {
        self.stream_error_after = Some(deltas);
        self
    }

    /// Add a reply to the queue.
    pub async fn add_response(&self, content: impl Into<String>) {
        self.replies.lock().await.push_back(Ok(content.into()));
    }

    /// Add a one-off failure to the queue.
    pub async fn add_failure(&self, failure: MockFailure) {
        self.replies.lock().await.push_back(Err(failure));
    }

    /// Number of `generate` and `generate_stream` calls.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Streams handed out and not yet dropped.
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_reply(&self, request: &GenerationRequest) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self.replies.lock().await.pop_front();
        match (queued, &self.failure) {
            (Some(Ok(content)), _) => Ok(content),
            (Some(Err(failure)), _) => Err(failure.to_error()),
            (None, Some(failure)) => Err(failure.to_error()),
            (None, None) => Ok(DEFAULT_MOCK_RESPONSE.to_string()),
        }
    }

    fn usage_for(&self, request: &GenerationRequest, content: &str) -> Usage {
        self.usage.unwrap_or_else(|| {
            Usage::new(
                estimate_tokens(&request.messages),
                estimate_text_tokens(content),
            )
        })
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let content = self.next_reply(request).await?;
        let usage = self.usage_for(request, &content);
        Ok(GenerationResponse::new(request, content)
            .with_usage(usage.prompt_tokens, usage.completion_tokens)
            .with_finish_reason(FinishReason::Stop))
    }

    async fn generate_stream(
        &self,
        request: &GenerationRequest,
    ) -> Result<BoxStream<'static, Result<ProviderChunk>>> {
        if !self.streaming {
            return Err(LlmError::NotSupported(format!(
                "streaming not supported by provider '{}'",
                self.name
            )));
        }

        let content = self.next_reply(request).await?;
        let usage = self.usage_for(request, &content);
        let error_after = self.stream_error_after;

        self.open_streams.fetch_add(1, Ordering::SeqCst);
        let guard = StreamGuard(self.open_streams.clone());

        let stream = async_stream::stream! {
            let _guard = guard;
            let pieces: Vec<String> = content.split_inclusive(' ').map(String::from).collect();

            for (i, piece) in pieces.into_iter().enumerate() {
                if error_after == Some(i) {
                    yield Err(LlmError::NetworkError("connection reset mid-stream".into()));
                    return;
                }
                tokio::task::yield_now().await;
                yield Ok(ProviderChunk::Delta(piece));
            }

            yield Ok(ProviderChunk::Finished {
                reason: FinishReason::Stop,
                usage: Some(usage),
            });
        };

        Ok(Box::pin(stream))
    }

    fn supports_streaming(&self) -> bool {
        self.streaming
    }
}
