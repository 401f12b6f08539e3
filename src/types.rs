//! Request, response and stream value types.
//!
//! A [`GenerationRequest`] lives for one orchestrated call. Responses are
//! serializable because the cache stores them as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::traits::{ChatMessage, ToolDefinition};

// ============================================================================
// Request
// ============================================================================

/// Sampling and output options for a generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for sampling (0.0 = deterministic).
    pub temperature: Option<f32>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<usize>,

    /// Top-p (nucleus) sampling.
    pub top_p: Option<f32>,

    /// Stop sequences.
    #[serde(default)]
    pub stop: Vec<String>,

    /// Tool/function declarations offered to the model.
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,

    /// Whether the caller asked for a streamed response.
    #[serde(default)]
    pub stream: bool,
}

impl GenerationOptions {
    /// Create options with a specific temperature.
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..Default::default()
        }
    }

    /// Set the output token cap.
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Scheduling hint carried with a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// Caller attribution attached to a request. Not part of the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    /// Free-form label such as "doc-answer" or "summary".
    pub purpose: Option<String>,
    #[serde(default)]
    pub priority: Priority,
}

/// One generation request.
///
/// Immutable once handed to the orchestrator; fallback attempts work on a
/// copy produced by [`GenerationRequest::retarget`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Unique request id.
    pub id: String,

    /// Provider id (e.g. "openai").
    pub provider: String,

    /// Provider-specific model id (e.g. "gpt-4o-mini").
    pub model: String,

    /// Ordered conversation.
    pub messages: Vec<ChatMessage>,

    /// Generation options.
    #[serde(default)]
    pub options: GenerationOptions,

    /// Caller attribution.
    #[serde(default)]
    pub metadata: RequestMetadata,

    /// Whether dispatch failures may fall back to other providers.
    #[serde(default = "default_true")]
    pub allow_fallback: bool,
}

fn default_true() -> bool {
    true
}

impl GenerationRequest {
    /// Create a request with a fresh id and default options.
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider: provider.into(),
            model: model.into(),
            messages,
            options: GenerationOptions::default(),
            metadata: RequestMetadata::default(),
            allow_fallback: true,
        }
    }

    /// Set generation options.
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Set caller metadata.
    pub fn with_metadata(mut self, metadata: RequestMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Override the generated id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Opt out of the fallback chain.
    pub fn without_fallback(mut self) -> Self {
        self.allow_fallback = false;
        self
    }

    /// Copy of this request addressed to another provider/model.
    pub fn retarget(&self, provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            ..self.clone()
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// Terminal condition of a generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    #[default]
    Stop,
    Length,
    FunctionCall,
    ToolCalls,
    ContentFilter,
}

impl FinishReason {
    /// Map a provider's finish/stop reason string onto the common enum.
    ///
    /// Unrecognised values map to [`FinishReason::Stop`].
    pub fn from_provider(reason: &str) -> Self {
        match reason.to_ascii_lowercase().as_str() {
            "length" | "max_tokens" | "max_output_tokens" => Self::Length,
            "function_call" => Self::FunctionCall,
            "tool_calls" | "tool_use" => Self::ToolCalls,
            "content_filter" | "safety" | "recitation" => Self::ContentFilter,
            _ => Self::Stop,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::FunctionCall => "function_call",
            Self::ToolCalls => "tool_calls",
            Self::ContentFilter => "content_filter",
        }
    }
}

/// Token usage counters. `total_tokens == prompt_tokens + completion_tokens`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

impl Usage {
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Recompute the total from its parts.
    pub fn normalized(self) -> Self {
        Self::new(self.prompt_tokens, self.completion_tokens)
    }
}

/// How the response was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Served from the response cache.
    pub cache_hit: bool,
    /// Served by a provider other than the requested one.
    pub fallback_used: bool,
    /// Number of failed dispatch attempts before this response.
    pub retries: u32,
}

/// A completed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Response id.
    pub id: String,

    /// Id of the request this answers.
    pub request_id: String,

    /// Provider that produced the content.
    pub provider: String,

    /// Model that produced the content.
    pub model: String,

    /// Full generated text.
    pub content: String,

    pub finish_reason: FinishReason,

    pub usage: Usage,

    /// Monetary cost, currency-less, never negative.
    pub cost: f64,

    /// Wall-clock latency of the orchestrated call in milliseconds.
    pub latency_ms: u64,

    pub metadata: ResponseMetadata,

    pub created_at: DateTime<Utc>,
}

impl GenerationResponse {
    /// Create a response for `request` with zero usage and a `stop` finish.
    pub fn new(request: &GenerationRequest, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            request_id: request.id.clone(),
            provider: request.provider.clone(),
            model: request.model.clone(),
            content: content.into(),
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
            cost: 0.0,
            latency_ms: 0,
            metadata: ResponseMetadata::default(),
            created_at: Utc::now(),
        }
    }

    /// Set token usage.
    pub fn with_usage(mut self, prompt: usize, completion: usize) -> Self {
        self.usage = Usage::new(prompt, completion);
        self
    }

    /// Set finish reason.
    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = reason;
        self
    }

    /// Override the reported model (some providers resolve aliases).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

// ============================================================================
// Streaming
// ============================================================================

/// One normalized stream element.
///
/// Concatenating every `delta` in emission order reproduces the final
/// chunk's `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Id shared by every chunk of one stream and by the synthesized response.
    pub id: String,

    pub request_id: String,

    /// Content accumulated so far, including `delta`.
    pub content: String,

    /// Fragment produced since the previous chunk.
    pub delta: String,

    /// Present only on the terminal chunk.
    pub finish_reason: Option<FinishReason>,

    /// Present only on the terminal chunk.
    pub usage: Option<Usage>,
}

impl StreamChunk {
    /// Whether this chunk ends the stream.
    pub fn is_terminal(&self) -> bool {
        self.finish_reason.is_some()
    }
}
