//! Stream normalization.
//!
//! Converts a provider-native [`ProviderChunk`] stream into [`StreamChunk`]s
//! carrying the accumulated content plus the newest delta.
//!
//! The normalized stream is lazy, single-pass and cannot be restarted. When
//! the provider signals completion, a complete [`GenerationResponse`] is
//! synthesized and handed to an async finalize hook *before* the terminal
//! chunk is yielded. A consumer that drops the stream earlier therefore never
//! triggers finalization, and dropping also drops the provider stream.

use futures::stream::BoxStream;
use futures::StreamExt;
use std::future::Future;

use crate::error::Result;
use crate::tokenizer::{estimate_text_tokens, estimate_tokens};
use crate::traits::ProviderChunk;
use crate::types::{FinishReason, GenerationRequest, GenerationResponse, StreamChunk, Usage};

/// Accumulates deltas for one stream.
#[derive(Debug)]
pub struct StreamAccumulator {
    request: GenerationRequest,
    id: String,
    content: String,
    usage: Option<Usage>,
    chunk_count: usize,
}

impl StreamAccumulator {
    /// Start accumulating for `request`.
    pub fn new(request: GenerationRequest) -> Self {
        Self {
            request,
            id: uuid::Uuid::new_v4().to_string(),
            content: String::new(),
            usage: None,
            chunk_count: 0,
        }
    }

    /// Stream id shared by every chunk and the synthesized response.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Content accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of non-terminal chunks emitted.
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Append a delta. Empty deltas produce no chunk.
    pub fn push_delta(&mut self, delta: String) -> Option<StreamChunk> {
        if delta.is_empty() {
            return None;
        }
        self.content.push_str(&delta);
        self.chunk_count += 1;
        Some(StreamChunk {
            id: self.id.clone(),
            request_id: self.request.id.clone(),
            content: self.content.clone(),
            delta,
            finish_reason: None,
            usage: None,
        })
    }

    /// Remember usage reported ahead of the finish event.
    pub fn record_usage(&mut self, usage: Usage) {
        self.usage = Some(usage.normalized());
    }

    /// Build the complete response from everything accumulated.
    ///
    /// Falls back to estimated usage when the provider reported none.
    pub fn into_response(self, reason: FinishReason, usage: Option<Usage>) -> GenerationResponse {
        let usage = usage.map(Usage::normalized).or(self.usage).unwrap_or_else(|| {
            Usage::new(
                estimate_tokens(&self.request.messages),
                estimate_text_tokens(&self.content),
            )
        });

        let mut response = GenerationResponse::new(&self.request, self.content)
            .with_finish_reason(reason);
        response.id = self.id;
        response.usage = usage;
        response
    }
}

/// Terminal chunk for a finalized response.
pub fn terminal_chunk(response: &GenerationResponse, delta: String) -> StreamChunk {
    StreamChunk {
        id: response.id.clone(),
        request_id: response.request_id.clone(),
        content: response.content.clone(),
        delta,
        finish_reason: Some(response.finish_reason),
        usage: Some(response.usage),
    }
}

/// Normalize `provider_stream` for `request`.
///
/// `finalize` receives the synthesized response on natural completion and
/// returns the version reported on the terminal chunk (with cost, latency and
/// flags filled in). A provider error is yielded once and ends the stream
/// without finalization. A provider stream that ends without a finish event
/// completes as [`FinishReason::Stop`].
pub fn normalize<F, Fut>(
    request: GenerationRequest,
    mut provider_stream: BoxStream<'static, Result<ProviderChunk>>,
    finalize: F,
) -> BoxStream<'static, Result<StreamChunk>>
where
    F: FnOnce(GenerationResponse) -> Fut + Send + 'static,
    Fut: Future<Output = GenerationResponse> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut accumulator = StreamAccumulator::new(request);
        let mut finish: Option<(FinishReason, Option<Usage>)> = None;

        while let Some(item) = provider_stream.next().await {
            match item {
                Ok(ProviderChunk::Delta(delta)) => {
                    if let Some(chunk) = accumulator.push_delta(delta) {
                        yield Ok(chunk);
                    }
                }
                Ok(ProviderChunk::Usage(usage)) => accumulator.record_usage(usage),
                Ok(ProviderChunk::Finished { reason, usage }) => {
                    finish = Some((reason, usage));
                    break;
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        // Release the provider connection before finalizing.
        drop(provider_stream);

        let (reason, usage) = finish.unwrap_or((FinishReason::Stop, None));
        let response = finalize(accumulator.into_response(reason, usage)).await;
        yield Ok(terminal_chunk(&response, String::new()));
    };

    Box::pin(stream)
}
