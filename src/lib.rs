//! LLM Orchestrator - Request Orchestration for Multi-Provider LLM Access
//!
//! Sits between application code and provider adapters and applies the
//! policies every call needs: validation against model context windows,
//! response caching, per-provider sliding-window rate limits, cost
//! accounting, cross-provider fallback, stream normalization, lifecycle
//! events and fire-and-forget request logging.
//!
//! # Architecture
//!
//! ```text
//!                    ┌──────────────────────────┐
//!   GenerationRequest│       Orchestrator       │ GenerationResponse / StreamChunk
//!  ─────────────────►│  validate ─► cache ─►    │──────────────────────────────►
//!                    │  rate limit ─► dispatch  │
//!                    │  ─► fallback ─► finalize │──► events (broadcast)
//!                    └────────────┬─────────────┘──► RequestLogger (spawned)
//!                                 │
//!              ┌──────────────────┼──────────────────┐
//!              ▼                  ▼                  ▼
//!       ProviderAdapter    ProviderAdapter    ProviderAdapter
//!          (openai)          (anthropic)         (google)
//! ```
//!
//! Provider adapters translate to and from a vendor API and implement
//! [`ProviderAdapter`]. This crate ships only [`providers::MockAdapter`].
//!
//! # Example
//!
//! ```ignore
//! use llm_orchestrator::{ChatMessage, GenerationRequest, ModelsConfig, Orchestrator};
//!
//! let orchestrator = Orchestrator::builder()
//!     .config(ModelsConfig::load()?)
//!     .adapter(Arc::new(my_openai_adapter))
//!     .build()?;
//!
//! let request = GenerationRequest::new("openai", "gpt-4o-mini", vec![ChatMessage::user("hi")]);
//! let response = orchestrator.generate(request).await?;
//! println!("{} ({})", response.content, format_cost(response.cost));
//! ```
//!
//! # See Also
//!
//! - [`crate::orchestrator`] for the request state machine
//! - [`crate::model_config`] for the TOML configuration format
//! - [`crate::traits`] for the adapter contract

pub mod cache;
pub mod cost_tracker;
pub mod error;
pub mod events;
pub mod logger;
pub mod model_config;
pub mod orchestrator;
pub mod providers;
pub mod rate_limiter;
pub mod registry;
pub mod stream;
pub mod tokenizer;
pub mod traits;
pub mod types;

pub use cache::{cache_key, CacheConfig, CacheStats, CacheStore, InMemoryCacheStore, ResponseCache};
pub use cost_tracker::{format_cost, CostCalculator, ModelPricing};
pub use error::{
    CacheError, LlmError, LoggerError, OrchestratorError, ProviderFailure, Result, ValidationError,
};
pub use events::{EventBus, OrchestratorEvent};
pub use logger::{
    InMemoryRequestLogger, LogLevel, MetricsRequestLogger, MetricsSummary, NoopRequestLogger,
    RequestLogRecord, RequestLogger, RequestLoggerStack, RequestStatus, TracingRequestLogger,
};
pub use model_config::{
    CacheSettings, FallbackModelPolicy, FallbackSettings, ModelCard, ModelConfigError, ModelCost,
    ModelsConfig, ProviderConfig, RateLimitSettings,
};
pub use orchestrator::{ChunkStream, Orchestrator, OrchestratorBuilder, RequestState};
pub use providers::{MockAdapter, MockFailure};
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
pub use registry::{ProviderEntry, ProviderRegistry};
pub use stream::StreamAccumulator;
pub use tokenizer::{estimate_text_tokens, estimate_tokens};
pub use traits::{ChatMessage, ChatRole, ProviderAdapter, ProviderChunk, ToolDefinition};
pub use types::{
    FinishReason, GenerationOptions, GenerationRequest, GenerationResponse, Priority,
    RequestMetadata, ResponseMetadata, StreamChunk, Usage,
};
