//! Orchestrator notifications.
//!
//! Each [`crate::orchestrator::Orchestrator`] owns one broadcast channel.
//! Subscribers receive events published after they subscribed; slow
//! subscribers lag and lose the oldest events instead of blocking requests.

use tokio::sync::broadcast;

use crate::types::{GenerationResponse, StreamChunk};

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Orchestrator events.
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    /// A request was answered from the cache.
    CacheHit { request_id: String, key: String },
    /// A request finished successfully and was finalized.
    ResponseCompleted(GenerationResponse),
    /// A normalized chunk was delivered to a stream consumer.
    StreamChunk(StreamChunk),
    /// A stream failed after it started.
    StreamError { request_id: String, error: String },
}

impl OrchestratorEvent {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CacheHit { .. } => "cache_hit",
            Self::ResponseCompleted(_) => "response_completed",
            Self::StreamChunk(_) => "stream_chunk",
            Self::StreamError { .. } => "stream_error",
        }
    }

    /// Request the event belongs to.
    pub fn request_id(&self) -> &str {
        match self {
            Self::CacheHit { request_id, .. } | Self::StreamError { request_id, .. } => request_id,
            Self::ResponseCompleted(response) => &response.request_id,
            Self::StreamChunk(chunk) => &chunk.request_id,
        }
    }
}

/// Instance-owned event bus.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<OrchestratorEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event.
    pub fn publish(&self, event: OrchestratorEvent) {
        // No receivers is not an error.
        let _ = self.sender.send(event);
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
