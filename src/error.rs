//! Error types for provider dispatch and request orchestration.
//!
//! # Error Taxonomy
//!
//! | Error | Raised by | Retried / fallback? |
//! |-------|-----------|---------------------|
//! | [`ValidationError`] | request validation | never |
//! | [`LlmError`] (wrapped in [`ProviderFailure`]) | provider adapters | triggers the fallback chain |
//! | [`OrchestratorError::AllProvidersFailed`] | orchestrator | terminal |
//! | [`CacheError`] / [`LoggerError`] | cache store / request logger | swallowed, logged with `tracing` |
//!
//! A failed call surfaces exactly one [`OrchestratorError`]. Validation errors
//! take precedence; otherwise the aggregated fallback failure is returned.

use thiserror::Error;

/// Result type for provider adapter operations.
pub type Result<T> = std::result::Result<T, LlmError>;

// ============================================================================
// Adapter Errors
// ============================================================================

/// Errors reported by provider adapters.
///
/// Every variant is treated as a dispatch failure by the orchestrator.
#[derive(Debug, Error)]
pub enum LlmError {
    /// API error from the provider.
    #[error("API error: {0}")]
    ApiError(String),

    /// Rate limit exceeded on the provider side.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication error.
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Model not found.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Network error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Provider-specific error.
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Timeout error.
    #[error("Request timed out")]
    Timeout,

    /// Feature not supported.
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl LlmError {
    /// Whether the failure is likely to go away on its own (network blips,
    /// provider throttling, 5xx responses).
    ///
    /// Used for log classification only; every dispatch failure triggers the
    /// fallback chain regardless.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NetworkError(_) | Self::Timeout | Self::RateLimited(_) => true,
            Self::ApiError(msg) => {
                msg.contains("500") || msg.contains("502") || msg.contains("503")
            }
            Self::ProviderError(_) => true,
            Self::InvalidRequest(_)
            | Self::AuthError(_)
            | Self::ModelNotFound(_)
            | Self::SerializationError(_)
            | Self::ConfigError(_)
            | Self::NotSupported(_)
            | Self::Unknown(_) => false,
        }
    }
}

// ============================================================================
// Validation Errors
// ============================================================================

/// Request rejected before any dispatch. Never retried, never falls back.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The request does not name a provider.
    #[error("request has no provider")]
    MissingProvider,

    /// The request does not name a model.
    #[error("request has no model")]
    MissingModel,

    /// Provider id is not registered.
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    /// Model id is not known for the provider.
    #[error("unknown model '{model}' for provider '{provider}'")]
    UnknownModel { provider: String, model: String },

    /// The request has no messages.
    #[error("request has no messages")]
    EmptyMessages,

    /// Estimated prompt tokens exceed the model's context window.
    #[error("context window exceeded for '{model}': max {max}, estimated {got}")]
    ContextWindowExceeded {
        model: String,
        max: usize,
        got: usize,
    },

    /// A generation option is out of range.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// Streaming was requested from a provider or model without streaming.
    #[error("provider '{provider}' does not support streaming")]
    StreamingNotSupported { provider: String },
}

// ============================================================================
// Orchestrator Errors
// ============================================================================

/// One failed attempt against one provider.
#[derive(Debug, Error)]
#[error("{provider}/{model}: {error}")]
pub struct ProviderFailure {
    /// Provider the attempt was made against.
    pub provider: String,
    /// Model identifier used for the attempt.
    pub model: String,
    /// Underlying adapter error.
    #[source]
    pub error: LlmError,
}

impl ProviderFailure {
    pub fn new(provider: impl Into<String>, model: impl Into<String>, error: LlmError) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            error,
        }
    }
}

/// Error returned to callers of the orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Request failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Dispatch failed and the caller opted out of fallback.
    #[error("dispatch failed: {0}")]
    Dispatch(ProviderFailure),

    /// The original provider and every fallback candidate failed.
    ///
    /// `failures[0]` is the original failure, followed by each fallback
    /// attempt in the order it was tried.
    #[error("all providers failed ({} attempts): {}", failures.len(), summarize(failures))]
    AllProvidersFailed { failures: Vec<ProviderFailure> },

    /// The provider stream failed after it started emitting chunks.
    #[error("stream failed: {0}")]
    Stream(ProviderFailure),

    /// The orchestrator was shut down.
    #[error("orchestrator has been shut down")]
    ShutDown,
}

impl OrchestratorError {
    /// Whether this is a validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Provider failures carried by this error, in attempt order.
    pub fn failures(&self) -> &[ProviderFailure] {
        match self {
            Self::AllProvidersFailed { failures } => failures,
            Self::Dispatch(failure) | Self::Stream(failure) => std::slice::from_ref(failure),
            Self::Validation(_) | Self::ShutDown => &[],
        }
    }
}

fn summarize(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Recoverable Collaborator Errors
// ============================================================================

/// Cache store failure. Reads degrade to a miss, writes are dropped.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing store failed.
    #[error("cache backend error: {0}")]
    Backend(String),

    /// A stored value could not be (de)serialized.
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Request logger failure. Never propagated to callers.
#[derive(Debug, Error)]
#[error("request logger error: {0}")]
pub struct LoggerError(pub String);
