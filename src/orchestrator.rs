//! Request orchestration.
//!
//! [`Orchestrator`] runs one state machine per call:
//!
//! ```text
//! Created ─► Validating ─► CacheLookup ─┬─────────────────────────────► Completed
//!                │                      │ (hit)
//!                ▼                      ▼ (miss)
//!             Failed ◄──────────── RateLimitWait ◄──── FallbackRetry
//!                                       │                    ▲
//!                                       ▼                    │ (failure, next candidate)
//!                                  Dispatching ──────────────┘
//!                                       │ (success)
//!                                       ▼
//!                                  Finalizing ─► Completed
//! ```
//!
//! Validation failures never dispatch and never fall back. Dispatch failures
//! walk the origin provider's fallback chain, each provider at most once.
//! Finalization computes cost and latency, writes the cache, hands the record
//! to the request logger in a background task and publishes
//! `response_completed`.
//!
//! Streams finalize only when the provider finishes. Dropping a stream early
//! drops the provider stream and skips caching and logging.
//!
//! # Example
//!
//! ```ignore
//! let orchestrator = Orchestrator::builder()
//!     .config(ModelsConfig::load()?)
//!     .adapter(Arc::new(openai_adapter))
//!     .adapter(Arc::new(anthropic_adapter))
//!     .build()?;
//!
//! let request = GenerationRequest::new("openai", "gpt-4o-mini", vec![ChatMessage::user("hi")]);
//! let response = orchestrator.generate(request).await?;
//!
//! orchestrator.shutdown().await;
//! ```

use futures::stream::BoxStream;
use futures::StreamExt;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, info_span, trace, warn, Instrument};

use crate::cache::{CacheStats, CacheStore, InMemoryCacheStore, ResponseCache};
use crate::cost_tracker::CostCalculator;
use crate::error::{LlmError, OrchestratorError, ProviderFailure, Result, ValidationError};
use crate::events::{EventBus, OrchestratorEvent, DEFAULT_EVENT_CAPACITY};
use crate::logger::{RequestLogRecord, RequestLogger, TracingRequestLogger};
use crate::model_config::{FallbackModelPolicy, FallbackSettings, ModelConfigError, ModelsConfig};
use crate::registry::{ProviderEntry, ProviderRegistry};
use crate::stream;
use crate::tokenizer::estimate_tokens;
use crate::traits::ProviderAdapter;
use crate::types::{GenerationRequest, GenerationResponse, ResponseMetadata, StreamChunk};

/// Stream of normalized chunks returned by [`Orchestrator::generate_stream`].
pub type ChunkStream = BoxStream<'static, std::result::Result<StreamChunk, OrchestratorError>>;

// ============================================================================
// Request State
// ============================================================================

/// Per-request orchestration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Created,
    Validating,
    CacheLookup,
    RateLimitWait,
    Dispatching,
    FallbackRetry,
    Finalizing,
    Completed,
    Failed,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Validating => "validating",
            Self::CacheLookup => "cache_lookup",
            Self::RateLimitWait => "rate_limit_wait",
            Self::Dispatching => "dispatching",
            Self::FallbackRetry => "fallback_retry",
            Self::Finalizing => "finalizing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct StateTracker {
    request_id: String,
    state: RequestState,
}

impl StateTracker {
    fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            state: RequestState::Created,
        }
    }

    fn enter(&mut self, next: RequestState) {
        trace!(
            request_id = %self.request_id,
            from = %self.state,
            to = %next,
            "Request state transition"
        );
        self.state = next;
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder {
    config: Option<ModelsConfig>,
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    cache_store: Option<Arc<dyn CacheStore>>,
    logger: Option<Arc<dyn RequestLogger>>,
    event_capacity: usize,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self {
            config: None,
            adapters: Vec::new(),
            cache_store: None,
            logger: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl OrchestratorBuilder {
    /// Use this configuration instead of [`ModelsConfig::load`].
    pub fn config(mut self, config: ModelsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register an adapter. Its name must match a configured provider.
    pub fn adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Register several adapters.
    pub fn adapters(mut self, adapters: impl IntoIterator<Item = Arc<dyn ProviderAdapter>>) -> Self {
        self.adapters.extend(adapters);
        self
    }

    /// Cache backend. Defaults to an [`InMemoryCacheStore`].
    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache_store = Some(store);
        self
    }

    /// Request logger. Defaults to [`TracingRequestLogger`].
    pub fn logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Buffer size of the event channel.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Validate configuration and construct the orchestrator.
    pub fn build(self) -> std::result::Result<Orchestrator, ModelConfigError> {
        let config = match self.config {
            Some(config) => config,
            None => ModelsConfig::load()?,
        };
        config.validate()?;

        let registry = ProviderRegistry::from_config(&config, self.adapters)?;
        let cache_config = config.cache.to_cache_config();
        let store = self
            .cache_store
            .unwrap_or_else(|| Arc::new(InMemoryCacheStore::new(cache_config.max_entries)));

        info!(
            providers = ?registry.list(),
            cache_enabled = cache_config.enabled,
            fallback_enabled = config.fallback.enabled,
            "Orchestrator started"
        );

        Ok(Orchestrator {
            inner: Arc::new(Inner {
                costs: CostCalculator::from_config(&config),
                cache: ResponseCache::new(store, cache_config),
                logger: self
                    .logger
                    .unwrap_or_else(|| Arc::new(TracingRequestLogger::new())),
                events: EventBus::new(self.event_capacity),
                fallback: config.fallback.clone(),
                registry,
                shut_down: AtomicBool::new(false),
                log_tasks: Mutex::new(JoinSet::new()),
            }),
        })
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

struct Inner {
    registry: ProviderRegistry,
    costs: CostCalculator,
    cache: ResponseCache,
    logger: Arc<dyn RequestLogger>,
    events: EventBus,
    fallback: FallbackSettings,
    shut_down: AtomicBool,
    log_tasks: Mutex<JoinSet<()>>,
}

/// Fallback candidate with its resolved model id.
struct Candidate {
    provider: String,
    model: Result<String>,
}

/// Successful dispatch of some candidate.
struct Dispatched<T> {
    value: T,
    target: GenerationRequest,
    attempt: usize,
    failed_attempts: usize,
}

/// Values finalization needs from the dispatch phase.
struct Finalize {
    request: GenerationRequest,
    target: GenerationRequest,
    cache_key: Option<String>,
    attempt: usize,
    failed_attempts: usize,
    started: Instant,
}

/// Coordinates validation, caching, rate limiting, dispatch and fallback.
///
/// Cheap to clone; clones share providers, limiters, cache and subscribers.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("providers", &self.inner.registry.list())
            .field("cache", &self.inner.cache)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Build with `config` and `adapters`, defaults for everything else.
    pub fn from_config(
        config: ModelsConfig,
        adapters: impl IntoIterator<Item = Arc<dyn ProviderAdapter>>,
    ) -> std::result::Result<Self, ModelConfigError> {
        Self::builder().config(config).adapters(adapters).build()
    }

    /// Subscribe to `cache_hit`, `response_completed`, `stream_chunk` and
    /// `stream_error` events.
    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.inner.events.subscribe()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.inner.registry
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats().await
    }

    /// Drop every cached response.
    pub async fn clear_cache(&self) {
        self.inner.cache.clear().await;
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    /// Reject new calls and wait for pending log writes.
    ///
    /// Streams already handed out keep running.
    pub async fn shutdown(&self) {
        if !self.inner.shut_down.swap(true, Ordering::SeqCst) {
            info!("Orchestrator shutting down");
        }
        self.flush_logs().await;
    }

    /// Wait for every log write spawned so far.
    pub async fn flush_logs(&self) {
        let mut tasks = {
            let mut guard = match self.inner.log_tasks.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::take(&mut *guard)
        };
        while tasks.join_next().await.is_some() {}
    }

    // ------------------------------------------------------------------------
    // Unary
    // ------------------------------------------------------------------------

    /// Generate a complete response.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, OrchestratorError> {
        let span = info_span!(
            "llm.generate",
            request_id = %request.id,
            provider = %request.provider,
            model = %request.model,
            stream = false
        );
        self.generate_inner(request).instrument(span).await
    }

    async fn generate_inner(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, OrchestratorError> {
        let started = Instant::now();
        let mut state = StateTracker::new(&request.id);

        if self.is_shut_down() {
            return Err(OrchestratorError::ShutDown);
        }

        state.enter(RequestState::Validating);
        if let Err(e) = self.validate(&request, false) {
            state.enter(RequestState::Failed);
            debug!(error = %e, "Request rejected");
            return Err(e.into());
        }

        state.enter(RequestState::CacheLookup);
        let cache_key = self.inner.cache.key_for(&request);
        if let Some(key) = &cache_key {
            if let Some(response) = self.serve_cached(&request, key, started).await {
                state.enter(RequestState::Completed);
                return Ok(response);
            }
        }

        let dispatched = self
            .dispatch(&request, false, started, &mut state, |adapter, target| async move {
                adapter.generate(&target).await
            })
            .await?;

        state.enter(RequestState::Finalizing);
        let response = self
            .finalize(
                dispatched.value,
                Finalize {
                    request,
                    target: dispatched.target,
                    cache_key,
                    attempt: dispatched.attempt,
                    failed_attempts: dispatched.failed_attempts,
                    started,
                },
            )
            .await;
        state.enter(RequestState::Completed);
        Ok(response)
    }

    // ------------------------------------------------------------------------
    // Streaming
    // ------------------------------------------------------------------------

    /// Generate a normalized chunk stream.
    ///
    /// Fails without returning a stream when the requested provider cannot
    /// stream or no candidate could open one. Errors after the stream has
    /// started are yielded as [`OrchestratorError::Stream`] and end it.
    pub async fn generate_stream(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<ChunkStream, OrchestratorError> {
        let span = info_span!(
            "llm.generate",
            request_id = %request.id,
            provider = %request.provider,
            model = %request.model,
            stream = true
        );
        self.generate_stream_inner(request).instrument(span).await
    }

    async fn generate_stream_inner(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<ChunkStream, OrchestratorError> {
        let started = Instant::now();
        let mut state = StateTracker::new(&request.id);

        if self.is_shut_down() {
            return Err(OrchestratorError::ShutDown);
        }

        state.enter(RequestState::Validating);
        if let Err(e) = self.validate(&request, true) {
            state.enter(RequestState::Failed);
            debug!(error = %e, "Stream request rejected");
            return Err(e.into());
        }

        state.enter(RequestState::CacheLookup);
        let cache_key = self.inner.cache.key_for(&request);
        if let Some(key) = &cache_key {
            if let Some(response) = self.serve_cached(&request, key, started).await {
                state.enter(RequestState::Completed);
                let chunk = stream::terminal_chunk(&response, response.content.clone());
                self.inner
                    .events
                    .publish(OrchestratorEvent::StreamChunk(chunk.clone()));
                return Ok(futures::stream::iter([Ok(chunk)]).boxed());
            }
        }

        let dispatched = self
            .dispatch(&request, true, started, &mut state, |adapter, target| async move {
                adapter.generate_stream(&target).await
            })
            .await?;

        // Finalizing happens inside the stream once the provider finishes.
        let target = dispatched.target;
        let original = request.clone();
        let finalize = Finalize {
            request,
            target: target.clone(),
            cache_key,
            attempt: dispatched.attempt,
            failed_attempts: dispatched.failed_attempts,
            started,
        };
        let this = self.clone();
        let normalized = stream::normalize(target.clone(), dispatched.value, move |response| {
            async move { this.finalize(response, finalize).await }
        });

        let this = self.clone();
        let chunks = async_stream::stream! {
            let mut normalized = normalized;
            while let Some(item) = normalized.next().await {
                match item {
                    Ok(chunk) => {
                        this.inner
                            .events
                            .publish(OrchestratorEvent::StreamChunk(chunk.clone()));
                        yield Ok(chunk);
                    }
                    Err(error) => {
                        warn!(
                            request_id = %target.id,
                            provider = %target.provider,
                            model = %target.model,
                            error = %error,
                            "Stream failed"
                        );
                        this.inner.events.publish(OrchestratorEvent::StreamError {
                            request_id: target.id.clone(),
                            error: error.to_string(),
                        });
                        this.spawn_log(RequestLogRecord::failed(
                            original,
                            error.to_string(),
                            started.elapsed().as_millis() as u64,
                        ));
                        yield Err(OrchestratorError::Stream(ProviderFailure::new(
                            target.provider.clone(),
                            target.model.clone(),
                            error,
                        )));
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(chunks))
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    /// Check `request` against the registry. No side effects.
    fn validate(
        &self,
        request: &GenerationRequest,
        streaming: bool,
    ) -> std::result::Result<&ProviderEntry, ValidationError> {
        if request.provider.is_empty() {
            return Err(ValidationError::MissingProvider);
        }
        if request.model.is_empty() {
            return Err(ValidationError::MissingModel);
        }

        let entry = self
            .inner
            .registry
            .get(&request.provider)
            .ok_or_else(|| ValidationError::UnknownProvider(request.provider.clone()))?;
        let card = entry
            .model(&request.model)
            .ok_or_else(|| ValidationError::UnknownModel {
                provider: request.provider.clone(),
                model: request.model.clone(),
            })?;

        if request.messages.is_empty() {
            return Err(ValidationError::EmptyMessages);
        }

        let options = &request.options;
        if let Some(t) = options.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ValidationError::InvalidOption(format!(
                    "temperature {} outside [0, 2]",
                    t
                )));
            }
        }
        if let Some(p) = options.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(ValidationError::InvalidOption(format!(
                    "top_p {} outside [0, 1]",
                    p
                )));
            }
        }
        match options.max_tokens {
            Some(0) => {
                return Err(ValidationError::InvalidOption(
                    "max_tokens must be positive".to_string(),
                ));
            }
            Some(n) if n > card.max_output_tokens => {
                return Err(ValidationError::InvalidOption(format!(
                    "max_tokens {} exceeds the {} output limit of '{}'",
                    n, card.max_output_tokens, request.model
                )));
            }
            _ => {}
        }

        let estimated = estimate_tokens(&request.messages);
        if estimated > card.context_length {
            return Err(ValidationError::ContextWindowExceeded {
                model: request.model.clone(),
                max: card.context_length,
                got: estimated,
            });
        }

        if streaming && !(entry.adapter().supports_streaming() && card.supports_streaming) {
            return Err(ValidationError::StreamingNotSupported {
                provider: request.provider.clone(),
            });
        }

        Ok(entry)
    }

    // ------------------------------------------------------------------------
    // Cache
    // ------------------------------------------------------------------------

    async fn serve_cached(
        &self,
        request: &GenerationRequest,
        key: &str,
        started: Instant,
    ) -> Option<GenerationResponse> {
        let mut response = self.inner.cache.get(key).await?;
        response.request_id = request.id.clone();
        response.latency_ms = started.elapsed().as_millis() as u64;
        // No dispatch happened for this call.
        response.metadata = ResponseMetadata {
            cache_hit: true,
            fallback_used: false,
            retries: 0,
        };

        debug!(request_id = %request.id, key, "Serving cached response");
        self.inner.events.publish(OrchestratorEvent::CacheHit {
            request_id: request.id.clone(),
            key: key.to_string(),
        });
        Some(response)
    }

    // ------------------------------------------------------------------------
    // Dispatch and fallback
    // ------------------------------------------------------------------------

    fn fallback_allowed(&self, request: &GenerationRequest) -> bool {
        request.allow_fallback && self.inner.fallback.enabled
    }

    /// Origin first, then the origin's fallback chain, each provider once.
    fn candidates(&self, request: &GenerationRequest) -> Vec<Candidate> {
        let mut candidates = vec![Candidate {
            provider: request.provider.clone(),
            model: Ok(request.model.clone()),
        }];
        if !self.fallback_allowed(request) {
            return candidates;
        }

        let Some(origin) = self.inner.registry.get(&request.provider) else {
            return candidates;
        };
        let origin_card = origin.model(&request.model);

        let mut visited = HashSet::new();
        visited.insert(request.provider.as_str());

        for provider in origin.fallback() {
            if !visited.insert(provider.as_str()) {
                continue;
            }
            let model = match self.inner.fallback.model_policy {
                FallbackModelPolicy::Preserve => Ok(request.model.clone()),
                FallbackModelPolicy::EquivalenceMap => origin_card
                    .and_then(|card| card.equivalent_on(provider))
                    .map(str::to_string)
                    .ok_or_else(|| {
                        LlmError::ModelNotFound(format!(
                            "no equivalent of '{}' configured for provider '{}'",
                            request.model, provider
                        ))
                    }),
            };
            candidates.push(Candidate {
                provider: provider.clone(),
                model,
            });
        }
        candidates
    }

    /// Try each candidate in order until one succeeds.
    async fn dispatch<T, F, Fut>(
        &self,
        request: &GenerationRequest,
        streaming: bool,
        started: Instant,
        state: &mut StateTracker,
        call: F,
    ) -> std::result::Result<Dispatched<T>, OrchestratorError>
    where
        F: Fn(Arc<dyn ProviderAdapter>, GenerationRequest) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut failures: Vec<ProviderFailure> = Vec::new();

        for (attempt, candidate) in self.candidates(request).into_iter().enumerate() {
            if attempt > 0 {
                state.enter(RequestState::FallbackRetry);
                info!(
                    request_id = %request.id,
                    from = %request.provider,
                    to = %candidate.provider,
                    attempt,
                    "Falling back to next provider"
                );
            }

            let model = match candidate.model {
                Ok(model) => model,
                Err(error) => {
                    debug!(provider = %candidate.provider, error = %error, "Skipping fallback candidate");
                    failures.push(ProviderFailure::new(
                        candidate.provider,
                        request.model.clone(),
                        error,
                    ));
                    continue;
                }
            };

            let target = request.retarget(&candidate.provider, &model);
            let entry = match self.validate(&target, streaming) {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(provider = %candidate.provider, model = %model, error = %e, "Fallback candidate rejected");
                    failures.push(ProviderFailure::new(
                        candidate.provider,
                        model,
                        validation_to_dispatch(e),
                    ));
                    continue;
                }
            };

            state.enter(RequestState::RateLimitWait);
            entry.limiter().admit().await;

            state.enter(RequestState::Dispatching);
            let timeout = entry.config().timeout();
            let outcome = match tokio::time::timeout(timeout, call(entry.adapter().clone(), target.clone()))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(LlmError::Timeout),
            };

            match outcome {
                Ok(value) => {
                    return Ok(Dispatched {
                        value,
                        target,
                        attempt,
                        failed_attempts: failures.len(),
                    });
                }
                Err(error) => {
                    warn!(
                        request_id = %request.id,
                        provider = %target.provider,
                        model = %target.model,
                        transient = error.is_transient(),
                        error = %error,
                        "Dispatch failed"
                    );
                    failures.push(ProviderFailure::new(target.provider, target.model, error));
                }
            }
        }

        state.enter(RequestState::Failed);
        let error = if self.fallback_allowed(request) {
            OrchestratorError::AllProvidersFailed { failures }
        } else {
            match failures.pop() {
                Some(failure) => OrchestratorError::Dispatch(failure),
                None => OrchestratorError::AllProvidersFailed { failures },
            }
        };

        self.spawn_log(RequestLogRecord::failed(
            request.clone(),
            error.to_string(),
            started.elapsed().as_millis() as u64,
        ));
        Err(error)
    }

    // ------------------------------------------------------------------------
    // Finalization
    // ------------------------------------------------------------------------

    async fn finalize(&self, mut response: GenerationResponse, ctx: Finalize) -> GenerationResponse {
        response.request_id = ctx.request.id.clone();
        response.usage = response.usage.normalized();
        response.cost =
            self.inner
                .costs
                .cost(&ctx.target.provider, &ctx.target.model, &response.usage);
        response.latency_ms = ctx.started.elapsed().as_millis() as u64;
        response.metadata = ResponseMetadata {
            cache_hit: false,
            fallback_used: ctx.attempt > 0,
            retries: ctx.failed_attempts as u32,
        };

        if let Some(key) = &ctx.cache_key {
            self.inner.cache.put(key, &response).await;
        }

        info!(
            request_id = %ctx.request.id,
            provider = %response.provider,
            model = %response.model,
            tokens = response.usage.total_tokens,
            cost = response.cost,
            latency_ms = response.latency_ms,
            fallback_used = response.metadata.fallback_used,
            "Request completed"
        );

        self.spawn_log(RequestLogRecord::completed(ctx.request, response.clone()));
        self.inner
            .events
            .publish(OrchestratorEvent::ResponseCompleted(response.clone()));
        response
    }

    /// Hand a record to the logger without waiting for it.
    fn spawn_log(&self, record: RequestLogRecord) {
        let logger = self.inner.logger.clone();
        let mut tasks = match self.inner.log_tasks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Reap finished writes.
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            if let Err(e) = logger.log(&record).await {
                warn!(
                    logger = logger.name(),
                    request_id = %record.request.id,
                    error = %e,
                    "Request logger failed"
                );
            }
        });
    }
}

fn validation_to_dispatch(error: ValidationError) -> LlmError {
    match error {
        ValidationError::UnknownProvider(_) => LlmError::ProviderError(error.to_string()),
        ValidationError::UnknownModel { .. } => LlmError::ModelNotFound(error.to_string()),
        ValidationError::StreamingNotSupported { .. } => LlmError::NotSupported(error.to_string()),
        other => LlmError::InvalidRequest(other.to_string()),
    }
}
