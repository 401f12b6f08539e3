//! End-to-end tests for unary generation through the orchestrator.
//!
//! All providers are `MockAdapter`s, so no network access is required. Tests
//! that depend on timing run on a paused clock.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use llm_orchestrator::{
    ChatMessage, FallbackModelPolicy, GenerationRequest, InMemoryRequestLogger, LlmError,
    LoggerError, MockAdapter, MockFailure, ModelCard, ModelsConfig, Orchestrator,
    OrchestratorError, OrchestratorEvent, ProviderAdapter, ProviderConfig, RateLimitSettings,
    RequestLogRecord, RequestLogger, RequestStatus, ValidationError,
};

// ============================================================================
// Helpers
// ============================================================================

/// Three providers chained a -> [b, c], each with one model mapped to the others.
fn chain_config() -> ModelsConfig {
    let card = |name: &str| {
        ModelCard::new(name)
            .with_context_length(1_000)
            .with_cost(0.001, 0.002)
            .with_equivalent("a", "a-model")
            .with_equivalent("b", "b-model")
            .with_equivalent("c", "c-model")
    };
    ModelsConfig {
        providers: vec![
            ProviderConfig::new("a")
                .with_fallback(["b", "c"])
                .with_model(card("a-model")),
            ProviderConfig::new("b")
                .with_fallback(["a"])
                .with_model(card("b-model")),
            ProviderConfig::new("c").with_model(card("c-model")),
        ],
        ..Default::default()
    }
}

fn orchestrator(
    config: ModelsConfig,
    adapters: Vec<MockAdapter>,
) -> (Orchestrator, Arc<InMemoryRequestLogger>) {
    let logger = Arc::new(InMemoryRequestLogger::new());
    let orchestrator = Orchestrator::builder()
        .config(config)
        .adapters(
            adapters
                .into_iter()
                .map(|a| Arc::new(a) as Arc<dyn ProviderAdapter>),
        )
        .logger(logger.clone())
        .build()
        .expect("orchestrator should build");
    (orchestrator, logger)
}

fn ask(provider: &str, model: &str, content: &str) -> GenerationRequest {
    GenerationRequest::new(provider, model, vec![ChatMessage::user(content)])
}

// ============================================================================
// Cache
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_identical_request_served_from_cache() {
    let openai = MockAdapter::new("openai").with_usage(8, 4);
    openai.add_response("Hello there").await;
    let (orch, logger) = orchestrator(ModelsConfig::builtin_defaults(), vec![openai.clone()]);
    let mut events = orch.subscribe();

    let first = orch
        .generate(ask("openai", "gpt-4o-mini", "hi"))
        .await
        .unwrap();
    assert!(!first.metadata.cache_hit);
    assert_eq!(first.content, "Hello there");

    let second_request = ask("openai", "gpt-4o-mini", "hi");
    let second_id = second_request.id.clone();
    let second = orch.generate(second_request).await.unwrap();

    assert!(second.metadata.cache_hit);
    assert_eq!(second.content, first.content);
    assert_eq!(second.usage, first.usage);
    assert_eq!(second.cost, first.cost);
    assert_eq!(second.request_id, second_id);
    assert_eq!(second.latency_ms, 0);
    assert_eq!(openai.call_count(), 1);

    let names: Vec<&'static str> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|e| e.name())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["response_completed", "cache_hit"]);

    // Cache hits are not logged.
    orch.flush_logs().await;
    assert_eq!(logger.len(), 1);

    let stats = orch.cache_stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_identical_misses_both_dispatch() {
    let openai = MockAdapter::new("openai").with_delay(Duration::from_millis(50));
    let (orch, _) = orchestrator(ModelsConfig::builtin_defaults(), vec![openai.clone()]);

    let (first, second) = tokio::join!(
        orch.generate(ask("openai", "gpt-4o-mini", "same question")),
        orch.generate(ask("openai", "gpt-4o-mini", "same question")),
    );

    assert!(!first.unwrap().metadata.cache_hit);
    assert!(!second.unwrap().metadata.cache_hit);
    assert_eq!(openai.call_count(), 2);

    // Later calls are served by whichever write landed.
    let third = orch
        .generate(ask("openai", "gpt-4o-mini", "same question"))
        .await
        .unwrap();
    assert!(third.metadata.cache_hit);
    assert_eq!(openai.call_count(), 2);
}

#[tokio::test]
async fn test_cache_hit_reports_no_fallback() {
    let a = MockAdapter::new("a").failing(MockFailure::Api("down".into()));
    let b = MockAdapter::new("b").failing(MockFailure::Auth);
    let c = MockAdapter::new("c");
    let (orch, _) = orchestrator(chain_config(), vec![a, b, c.clone()]);

    let first = orch.generate(ask("a", "a-model", "hello")).await.unwrap();
    assert!(first.metadata.fallback_used);
    assert_eq!(first.metadata.retries, 2);

    let hit = orch.generate(ask("a", "a-model", "hello")).await.unwrap();
    assert!(hit.metadata.cache_hit);
    assert!(!hit.metadata.fallback_used);
    assert_eq!(hit.metadata.retries, 0);
    assert_eq!(hit.provider, "c");
    assert_eq!(c.call_count(), 1);
}

#[tokio::test]
async fn test_different_options_miss_the_cache() {
    let openai = MockAdapter::new("openai");
    let (orch, _) = orchestrator(ModelsConfig::builtin_defaults(), vec![openai.clone()]);

    orch.generate(ask("openai", "gpt-4o-mini", "hi"))
        .await
        .unwrap();
    orch.generate(
        ask("openai", "gpt-4o-mini", "hi")
            .with_options(llm_orchestrator::GenerationOptions::with_temperature(0.2)),
    )
    .await
    .unwrap();

    assert_eq!(openai.call_count(), 2);
}

#[tokio::test]
async fn test_disabled_cache_always_dispatches() {
    let mut config = ModelsConfig::builtin_defaults();
    config.cache.enabled = false;
    let openai = MockAdapter::new("openai");
    let (orch, _) = orchestrator(config, vec![openai.clone()]);

    for _ in 0..3 {
        let response = orch
            .generate(ask("openai", "gpt-4o-mini", "hi"))
            .await
            .unwrap();
        assert!(!response.metadata.cache_hit);
    }
    assert_eq!(openai.call_count(), 3);
}

// ============================================================================
// Validation, usage and cost
// ============================================================================

#[tokio::test]
async fn test_context_overflow_rejected_before_dispatch() {
    let a = MockAdapter::new("a");
    let b = MockAdapter::new("b");
    let c = MockAdapter::new("c");
    let (orch, logger) = orchestrator(chain_config(), vec![a.clone(), b.clone(), c.clone()]);

    let err = orch
        .generate(ask("a", "a-model", &"word ".repeat(1_000)))
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert!(matches!(
        err,
        OrchestratorError::Validation(ValidationError::ContextWindowExceeded { max: 1_000, .. })
    ));
    assert_eq!(a.call_count() + b.call_count() + c.call_count(), 0);

    orch.flush_logs().await;
    assert!(logger.is_empty());
}

#[tokio::test]
async fn test_unregistered_provider_is_validation_error() {
    let (orch, _) = orchestrator(
        ModelsConfig::builtin_defaults(),
        vec![MockAdapter::new("openai")],
    );

    let err = orch
        .generate(ask("google", "gemini-1.5-flash", "hi"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Validation(ValidationError::UnknownProvider(ref p)) if p == "google"
    ));
}

#[tokio::test]
async fn test_usage_totals_and_cost() {
    let openai = MockAdapter::new("openai").with_usage(2_000, 1_000);
    let (orch, _) = orchestrator(ModelsConfig::builtin_defaults(), vec![openai]);

    let response = orch
        .generate(ask("openai", "gpt-4o-mini", "price this"))
        .await
        .unwrap();

    let usage = response.usage;
    assert_eq!(
        usage.total_tokens,
        usage.prompt_tokens + usage.completion_tokens
    );
    // 2 * 0.00015 + 1 * 0.0006
    assert!((response.cost - 0.0009).abs() < 1e-12);
    assert!(response.cost >= 0.0);
}

// ============================================================================
// Fallback
// ============================================================================

#[tokio::test]
async fn test_all_providers_failed_lists_each_attempt_once() {
    let a = MockAdapter::new("a").failing(MockFailure::Api("500".into()));
    let b = MockAdapter::new("b").failing(MockFailure::Network("reset".into()));
    let c = MockAdapter::new("c").failing(MockFailure::RateLimited);
    let (orch, logger) = orchestrator(chain_config(), vec![a.clone(), b.clone(), c.clone()]);

    let err = orch
        .generate(ask("a", "a-model", "hello"))
        .await
        .unwrap_err();

    let failures = err.failures();
    assert!(matches!(err, OrchestratorError::AllProvidersFailed { .. }));
    assert_eq!(failures.len(), 3);
    let providers: Vec<&str> = failures.iter().map(|f| f.provider.as_str()).collect();
    assert_eq!(providers, vec!["a", "b", "c"]);
    assert!(matches!(failures[0].error, LlmError::ApiError(_)));
    assert!(matches!(failures[1].error, LlmError::NetworkError(_)));
    assert!(matches!(failures[2].error, LlmError::RateLimited(_)));

    // b lists a as its own fallback; a must not be retried.
    assert_eq!(a.call_count(), 1);
    assert_eq!(b.call_count(), 1);
    assert_eq!(c.call_count(), 1);

    orch.flush_logs().await;
    let records = logger.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, RequestStatus::Failed);
    assert!(records[0].response.is_none());
}

#[tokio::test]
async fn test_fallback_success_reports_metadata() {
    let a = MockAdapter::new("a").failing(MockFailure::Api("overloaded".into()));
    let b = MockAdapter::new("b").failing(MockFailure::Auth);
    let c = MockAdapter::new("c");
    c.add_response("from c").await;
    let (orch, _) = orchestrator(chain_config(), vec![a, b, c.clone()]);

    let response = orch.generate(ask("a", "a-model", "hello")).await.unwrap();

    assert_eq!(response.content, "from c");
    assert_eq!(response.provider, "c");
    assert_eq!(response.model, "c-model");
    assert!(response.metadata.fallback_used);
    assert_eq!(response.metadata.retries, 2);
    assert_eq!(c.requests().await[0].model, "c-model");
}

#[tokio::test]
async fn test_missing_equivalent_skips_candidate() {
    let mut config = chain_config();
    config.providers[0].models[0].equivalents.remove("b");
    let a = MockAdapter::new("a").failing(MockFailure::Api("down".into()));
    let b = MockAdapter::new("b");
    let c = MockAdapter::new("c");
    let (orch, _) = orchestrator(config, vec![a, b.clone(), c.clone()]);

    let response = orch.generate(ask("a", "a-model", "hello")).await.unwrap();

    assert_eq!(response.provider, "c");
    assert_eq!(response.metadata.retries, 2);
    assert_eq!(b.call_count(), 0);
}

#[tokio::test]
async fn test_preserve_policy_keeps_model_id() {
    let shared = |name: &str| ProviderConfig::new(name).with_model(ModelCard::new("shared-model"));
    let mut config = ModelsConfig {
        providers: vec![shared("a").with_fallback(["b"]), shared("b")],
        ..Default::default()
    };
    config.fallback.model_policy = FallbackModelPolicy::Preserve;

    let a = MockAdapter::new("a").failing(MockFailure::Timeout);
    let b = MockAdapter::new("b");
    let (orch, _) = orchestrator(config, vec![a, b.clone()]);

    let response = orch
        .generate(ask("a", "shared-model", "hello"))
        .await
        .unwrap();
    assert_eq!(response.provider, "b");
    assert_eq!(response.model, "shared-model");
}

#[tokio::test]
async fn test_fallback_disabled_in_config_surfaces_dispatch_error() {
    let mut config = chain_config();
    config.fallback.enabled = false;
    let a = MockAdapter::new("a").failing(MockFailure::Api("down".into()));
    let b = MockAdapter::new("b");
    let (orch, _) = orchestrator(config, vec![a, b.clone(), MockAdapter::new("c")]);

    let err = orch
        .generate(ask("a", "a-model", "hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Dispatch(ref f) if f.provider == "a"));
    assert_eq!(b.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_triggers_fallback() {
    let mut config = chain_config();
    config.providers[0].timeout_seconds = 1;
    let a = MockAdapter::new("a").with_delay(Duration::from_secs(30));
    let b = MockAdapter::new("b");
    let (orch, _) = orchestrator(config, vec![a, b.clone(), MockAdapter::new("c")]);

    let started = Instant::now();
    let response = orch.generate(ask("a", "a-model", "hello")).await.unwrap();

    assert_eq!(response.provider, "b");
    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(b.call_count(), 1);
}

// ============================================================================
// Rate limiting
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_request_over_limit_waits_for_window() {
    let mut config = ModelsConfig {
        providers: vec![ProviderConfig::new("solo")
            .with_rate_limit(RateLimitSettings::new(2, 100_000))
            .with_model(ModelCard::new("solo-model"))],
        ..Default::default()
    };
    config.cache.enabled = false;
    let solo = MockAdapter::new("solo");
    let (orch, _) = orchestrator(config, vec![solo.clone()]);

    let started = Instant::now();
    for _ in 0..2 {
        orch.generate(ask("solo", "solo-model", "hi")).await.unwrap();
    }
    assert!(started.elapsed() < Duration::from_secs(1));

    orch.generate(ask("solo", "solo-model", "hi")).await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(60));
    assert_eq!(solo.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_wait_does_not_block_other_requests() {
    let config = ModelsConfig {
        providers: vec![
            ProviderConfig::new("slow")
                .with_rate_limit(RateLimitSettings::new(1, 100_000))
                .with_model(ModelCard::new("slow-model")),
            ProviderConfig::new("fast").with_model(ModelCard::new("fast-model")),
        ],
        ..Default::default()
    };
    let slow = MockAdapter::new("slow");
    let fast = MockAdapter::new("fast");
    let (orch, _) = orchestrator(config, vec![slow.clone(), fast.clone()]);

    let test_start = Instant::now();
    orch.generate(ask("slow", "slow-model", "warm"))
        .await
        .unwrap();

    // Second slow call finds the window full and waits.
    let waiting = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.generate(ask("slow", "slow-model", "other")).await })
    };
    tokio::task::yield_now().await;

    let started = Instant::now();
    let other_provider = orch
        .generate(ask("fast", "fast-model", "hello"))
        .await
        .unwrap();
    let cached = orch
        .generate(ask("slow", "slow-model", "warm"))
        .await
        .unwrap();

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(other_provider.provider, "fast");
    assert!(cached.metadata.cache_hit);
    assert!(!waiting.is_finished());

    waiting.await.unwrap().unwrap();
    assert!(test_start.elapsed() >= Duration::from_secs(60));
    assert_eq!(slow.call_count(), 2);
    assert_eq!(fast.call_count(), 1);
}

// ============================================================================
// Logging, events and shutdown
// ============================================================================

struct BrokenLogger;

#[async_trait]
impl RequestLogger for BrokenLogger {
    fn name(&self) -> &str {
        "broken"
    }

    async fn log(&self, _record: &RequestLogRecord) -> Result<(), LoggerError> {
        Err(LoggerError("disk full".into()))
    }
}

#[tokio::test]
async fn test_logger_failure_does_not_fail_request() {
    let orch = Orchestrator::builder()
        .config(ModelsConfig::builtin_defaults())
        .adapter(Arc::new(MockAdapter::new("openai")))
        .logger(Arc::new(BrokenLogger))
        .build()
        .unwrap();

    let response = orch.generate(ask("openai", "gpt-4o", "hi")).await;
    assert!(response.is_ok());
    orch.flush_logs().await;
}

#[tokio::test]
async fn test_default_logger_writes_to_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let orch = Orchestrator::builder()
        .config(ModelsConfig::builtin_defaults())
        .adapter(Arc::new(MockAdapter::new("openai")))
        .build()
        .unwrap();

    orch.generate(ask("openai", "gpt-4o", "hi")).await.unwrap();
    orch.shutdown().await;
    assert!(orch.is_shut_down());
}

#[tokio::test]
async fn test_completed_request_logged_once() {
    let openai = MockAdapter::new("openai").with_usage(10, 5);
    let (orch, logger) = orchestrator(ModelsConfig::builtin_defaults(), vec![openai]);

    let response = orch.generate(ask("openai", "gpt-4o", "hi")).await.unwrap();
    orch.flush_logs().await;

    let records = logger.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, RequestStatus::Completed);
    assert_eq!(records[0].usage, response.usage);
    assert_eq!(records[0].cost, response.cost);
}

#[tokio::test]
async fn test_response_completed_event_carries_response() {
    let (orch, _) = orchestrator(
        ModelsConfig::builtin_defaults(),
        vec![MockAdapter::new("openai")],
    );
    let mut events = orch.subscribe();

    let response = orch.generate(ask("openai", "gpt-4o", "hi")).await.unwrap();

    match events.recv().await.unwrap() {
        OrchestratorEvent::ResponseCompleted(published) => {
            assert_eq!(published.id, response.id);
            assert_eq!(published.request_id, response.request_id);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_shutdown_flushes_and_rejects() {
    let (orch, logger) = orchestrator(
        ModelsConfig::builtin_defaults(),
        vec![MockAdapter::new("openai")],
    );

    orch.generate(ask("openai", "gpt-4o", "hi")).await.unwrap();
    orch.shutdown().await;

    assert_eq!(logger.len(), 1);
    assert!(matches!(
        orch.generate(ask("openai", "gpt-4o", "again")).await,
        Err(OrchestratorError::ShutDown)
    ));
}
