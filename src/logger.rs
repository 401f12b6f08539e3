//! Request logging sinks.
//!
//! The orchestrator hands one [`RequestLogRecord`] to its [`RequestLogger`]
//! per finished request: on completion, or once the fallback chain is
//! exhausted. Logging is fire-and-forget. A failing sink is reported with
//! `tracing::warn!` and never affects the caller.
//!
//! # Example
//! ```ignore
//! use llm_orchestrator::logger::{MetricsRequestLogger, RequestLoggerStack, TracingRequestLogger};
//!
//! let metrics = Arc::new(MetricsRequestLogger::new());
//! let mut stack = RequestLoggerStack::new();
//! stack.add(Arc::new(TracingRequestLogger::new()));
//! stack.add(metrics.clone());
//!
//! let orchestrator = Orchestrator::builder().logger(Arc::new(stack)).build()?;
//! // ...
//! println!("{}", metrics.summary());
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, trace, warn};

use crate::error::LoggerError;
use crate::types::{GenerationRequest, GenerationResponse, Usage};

// ============================================================================
// Record
// ============================================================================

/// Final status of a logged request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Completed,
    Failed,
}

/// One append-only log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLogRecord {
    pub request: GenerationRequest,
    pub response: Option<GenerationResponse>,
    pub error: Option<String>,
    pub status: RequestStatus,
    pub usage: Usage,
    pub cost: f64,
    pub latency_ms: u64,
    pub logged_at: DateTime<Utc>,
}

impl RequestLogRecord {
    /// Record for a successful request.
    pub fn completed(request: GenerationRequest, response: GenerationResponse) -> Self {
        Self {
            usage: response.usage,
            cost: response.cost,
            latency_ms: response.latency_ms,
            request,
            response: Some(response),
            error: None,
            status: RequestStatus::Completed,
            logged_at: Utc::now(),
        }
    }

    /// Record for a request that finally failed.
    pub fn failed(request: GenerationRequest, error: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            request,
            response: None,
            error: Some(error.into()),
            status: RequestStatus::Failed,
            usage: Usage::default(),
            cost: 0.0,
            latency_ms,
            logged_at: Utc::now(),
        }
    }
}

// ============================================================================
// Logger Trait
// ============================================================================

/// Append-only sink for finished requests.
#[async_trait]
pub trait RequestLogger: Send + Sync {
    /// Logger name for diagnostics.
    fn name(&self) -> &str;

    /// Append one record.
    async fn log(&self, record: &RequestLogRecord) -> Result<(), LoggerError>;
}

// ============================================================================
// Logger Stack
// ============================================================================

/// Fan-out to several loggers in registration order.
///
/// Every logger is invoked even if an earlier one fails; failures are
/// joined into one error.
#[derive(Default)]
pub struct RequestLoggerStack {
    loggers: Vec<Arc<dyn RequestLogger>>,
}

impl RequestLoggerStack {
    /// Create a new empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a logger to the stack.
    pub fn add(&mut self, logger: Arc<dyn RequestLogger>) {
        self.loggers.push(logger);
    }

    /// Get the number of loggers.
    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    /// Check if the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}

#[async_trait]
impl RequestLogger for RequestLoggerStack {
    fn name(&self) -> &str {
        "stack"
    }

    async fn log(&self, record: &RequestLogRecord) -> Result<(), LoggerError> {
        let mut errors = Vec::new();
        for logger in &self.loggers {
            if let Err(e) = logger.log(record).await {
                errors.push(format!("{}: {}", logger.name(), e));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(LoggerError(errors.join("; ")))
        }
    }
}

// ============================================================================
// Built-in Loggers
// ============================================================================

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRequestLogger;

#[async_trait]
impl RequestLogger for NoopRequestLogger {
    fn name(&self) -> &str {
        "noop"
    }

    async fn log(&self, _record: &RequestLogRecord) -> Result<(), LoggerError> {
        Ok(())
    }
}

/// Log level for [`TracingRequestLogger`].
#[derive(Debug, Clone, Copy, Default)]
pub enum LogLevel {
    /// Request/response summary.
    #[default]
    Info,
    /// Summary plus a content preview.
    Debug,
    /// Complete request and response.
    Trace,
}

/// Emits each record as a `tracing` event.
#[derive(Debug, Default)]
pub struct TracingRequestLogger {
    log_level: LogLevel,
}

impl TracingRequestLogger {
    /// Create a logger at [`LogLevel::Info`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logger with specified log level.
    pub fn with_level(level: LogLevel) -> Self {
        Self { log_level: level }
    }
}

fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let truncated: String = text.chars().take(max - 3).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

#[async_trait]
impl RequestLogger for TracingRequestLogger {
    fn name(&self) -> &str {
        "tracing"
    }

    async fn log(&self, record: &RequestLogRecord) -> Result<(), LoggerError> {
        let request = &record.request;

        if record.status == RequestStatus::Failed {
            warn!(
                request_id = %request.id,
                provider = %request.provider,
                model = %request.model,
                latency_ms = record.latency_ms,
                error = record.error.as_deref().unwrap_or_default(),
                "[LLM] Request failed"
            );
            return Ok(());
        }

        let served_by = record
            .response
            .as_ref()
            .map(|r| format!("{}/{}", r.provider, r.model))
            .unwrap_or_default();

        match self.log_level {
            LogLevel::Info => {
                info!(
                    request_id = %request.id,
                    provider = %request.provider,
                    model = %request.model,
                    served_by = %served_by,
                    tokens = record.usage.total_tokens,
                    cost = record.cost,
                    latency_ms = record.latency_ms,
                    "[LLM] Request completed"
                );
            }
            LogLevel::Debug => {
                let content = record
                    .response
                    .as_ref()
                    .map(|r| preview(&r.content, 200))
                    .unwrap_or_default();
                debug!(
                    request_id = %request.id,
                    served_by = %served_by,
                    prompt_tokens = record.usage.prompt_tokens,
                    completion_tokens = record.usage.completion_tokens,
                    cost = record.cost,
                    latency_ms = record.latency_ms,
                    content_preview = %content,
                    "[LLM] Request completed"
                );
            }
            LogLevel::Trace => {
                trace!(record = ?record, "[LLM] Full request record");
            }
        }
        Ok(())
    }
}

/// Aggregates counters over every logged record.
#[derive(Debug, Default)]
pub struct MetricsRequestLogger {
    /// Total records logged.
    pub total_requests: AtomicU64,
    /// Records with [`RequestStatus::Failed`].
    pub failed_requests: AtomicU64,
    /// Completed requests served by a fallback provider.
    pub fallback_requests: AtomicU64,
    /// Total prompt tokens.
    pub prompt_tokens: AtomicU64,
    /// Total completion tokens.
    pub completion_tokens: AtomicU64,
    /// Total latency in milliseconds.
    pub total_time_ms: AtomicU64,
    /// Total cost in millionths of a currency unit.
    pub cost_micros: AtomicU64,
}

impl MetricsRequestLogger {
    /// Create a new metrics logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all counters.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            fallback_requests: self.fallback_requests.load(Ordering::Relaxed),
            prompt_tokens: self.prompt_tokens.load(Ordering::Relaxed),
            completion_tokens: self.completion_tokens.load(Ordering::Relaxed),
            total_time_ms: self.total_time_ms.load(Ordering::Relaxed),
            total_cost: self.cost_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0,
        }
    }
}

#[async_trait]
impl RequestLogger for MetricsRequestLogger {
    fn name(&self) -> &str {
        "metrics"
    }

    async fn log(&self, record: &RequestLogRecord) -> Result<(), LoggerError> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_time_ms
            .fetch_add(record.latency_ms, Ordering::Relaxed);

        match record.status {
            RequestStatus::Failed => {
                self.failed_requests.fetch_add(1, Ordering::Relaxed);
            }
            RequestStatus::Completed => {
                self.prompt_tokens
                    .fetch_add(record.usage.prompt_tokens as u64, Ordering::Relaxed);
                self.completion_tokens
                    .fetch_add(record.usage.completion_tokens as u64, Ordering::Relaxed);
                self.cost_micros
                    .fetch_add((record.cost * 1_000_000.0).round() as u64, Ordering::Relaxed);
                if record
                    .response
                    .as_ref()
                    .is_some_and(|r| r.metadata.fallback_used)
                {
                    self.fallback_requests.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        Ok(())
    }
}

/// Snapshot of [`MetricsRequestLogger`] counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSummary {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub fallback_requests: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_time_ms: u64,
    pub total_cost: f64,
}

impl MetricsSummary {
    /// Get the average latency in milliseconds.
    pub fn average_latency_ms(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.total_time_ms as f64 / self.total_requests as f64
        }
    }

    /// Fraction of requests that failed.
    pub fn failure_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.failed_requests as f64 / self.total_requests as f64
        }
    }
}

impl fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reqs={} failed={} fallback={} tokens={}/{} cost={} latency={:.0}ms",
            self.total_requests,
            self.failed_requests,
            self.fallback_requests,
            self.prompt_tokens,
            self.completion_tokens,
            crate::cost_tracker::format_cost(self.total_cost),
            self.average_latency_ms()
        )
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct InMemoryRequestLogger {
    records: Mutex<Vec<RequestLogRecord>>,
}

impl InMemoryRequestLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all records so far.
    pub fn records(&self) -> Vec<RequestLogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RequestLogger for InMemoryRequestLogger {
    fn name(&self) -> &str {
        "memory"
    }

    async fn log(&self, record: &RequestLogRecord) -> Result<(), LoggerError> {
        self.records
            .lock()
            .map_err(|e| LoggerError(e.to_string()))?
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ChatMessage;

    fn request() -> GenerationRequest {
        GenerationRequest::new("openai", "gpt-4o-mini", vec![ChatMessage::user("hi")])
    }

    fn completed() -> RequestLogRecord {
        let req = request();
        let mut response = GenerationResponse::new(&req, "hello").with_usage(10, 5);
        response.cost = 0.25;
        response.latency_ms = 40;
        RequestLogRecord::completed(req, response)
    }

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

    #[test]
    fn test_record_constructors() {
        let record = completed();
        assert_eq!(record.status, RequestStatus::Completed);
        assert_eq!(record.usage.total_tokens, 15);
        assert_eq!(record.latency_ms, 40);

        let failed = RequestLogRecord::failed(request(), "all providers failed", 12);
        assert_eq!(failed.status, RequestStatus::Failed);
        assert!(failed.response.is_none());
        assert_eq!(failed.cost, 0.0);
    }

    #[tokio::test]
    async fn test_metrics_logger() {
        let metrics = MetricsRequestLogger::new();
        metrics.log(&completed()).await.unwrap();
        metrics
            .log(&RequestLogRecord::failed(request(), "boom", 20))
            .await
            .unwrap();

        let summary = metrics.summary();
        assert_eq!(summary.total_requests, 2);
        assert_eq!(summary.failed_requests, 1);
        assert_eq!(summary.prompt_tokens, 10);
        assert_eq!(summary.completion_tokens, 5);
        assert_eq!(summary.total_time_ms, 60);
        assert!((summary.total_cost - 0.25).abs() < 1e-9);
        assert_eq!(summary.average_latency_ms(), 30.0);
        assert_eq!(summary.failure_rate(), 0.5);
    }

    #[tokio::test]
    async fn test_stack_invokes_all_and_joins_errors() {
        let memory = Arc::new(InMemoryRequestLogger::new());
        let mut stack = RequestLoggerStack::new();
        stack.add(Arc::new(BrokenLogger));
        stack.add(memory.clone());
        stack.add(Arc::new(TracingRequestLogger::with_level(LogLevel::Debug)));
        assert_eq!(stack.len(), 3);

        let err = stack.log(&completed()).await.unwrap_err();
        assert!(err.to_string().contains("broken: "));
        assert_eq!(memory.len(), 1);
    }

    #[tokio::test]
    async fn test_tracing_logger_levels() {
        for level in [LogLevel::Info, LogLevel::Debug, LogLevel::Trace] {
            let logger = TracingRequestLogger::with_level(level);
            assert!(logger.log(&completed()).await.is_ok());
        }
        let logger = TracingRequestLogger::new();
        let failed = RequestLogRecord::failed(request(), "boom", 1);
        assert!(logger.log(&failed).await.is_ok());
    }

    #[test]
    fn test_preview_truncates_by_chars() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("ééééééééééé", 5), "éé...");
    }

    #[test]
    fn test_summary_display() {
        let summary = MetricsSummary {
            total_requests: 2,
            total_time_ms: 100,
            ..Default::default()
        };
        let text = summary.to_string();
        assert!(text.contains("reqs=2"));
        assert!(text.contains("latency=50ms"));
    }
}
