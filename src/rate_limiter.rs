//! Per-provider sliding-window admission control.
//!
//! Each provider gets one [`RateLimiter`] holding two timestamp lists: one
//! entry per admitted request for the request limit and one per admission for
//! the token limit. Both lists are pruned to the trailing window on every
//! check.
//!
//! ## Admission
//!
//! 1. Prune timestamps older than the window from both lists.
//! 2. If either list is at its limit, sleep until its oldest timestamp ages
//!    out (`oldest + window - now`), then go back to 1.
//! 3. Otherwise append `now` to both lists and return.
//!
//! ## Known limitation
//!
//! This is a blocking admission check, not a fair queue. Callers waiting on
//! the same exhausted window wake at the same instant and race for the freed
//! slots; each loser computes a new wait and sleeps again.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Rate limiter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Maximum admissions per window.
    pub requests_per_minute: usize,
    /// Maximum entries in the token list per window.
    pub tokens_per_minute: usize,
    /// Length of the sliding window.
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            tokens_per_minute: 90_000,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimiterConfig {
    /// Create a new config with specified limits and a 60 second window.
    pub fn new(requests_per_minute: usize, tokens_per_minute: usize) -> Self {
        Self {
            requests_per_minute,
            tokens_per_minute,
            ..Default::default()
        }
    }

    /// Set the window length.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }
}

/// Timestamps admitted within the trailing window.
#[derive(Debug, Default)]
struct SlidingWindow {
    requests: VecDeque<Instant>,
    tokens: VecDeque<Instant>,
}

impl SlidingWindow {
    fn prune(&mut self, now: Instant, window: Duration) {
        for list in [&mut self.requests, &mut self.tokens] {
            while let Some(&oldest) = list.front() {
                if now.duration_since(oldest) >= window {
                    list.pop_front();
                } else {
                    break;
                }
            }
        }
    }

    /// Time until a full list frees a slot, or `None` when admission is safe.
    fn wait_time(&self, now: Instant, config: &RateLimiterConfig) -> Option<Duration> {
        let full = |list: &VecDeque<Instant>, limit: usize| {
            if list.len() >= limit {
                list.front()
                    .map(|&oldest| (oldest + config.window).saturating_duration_since(now))
            } else {
                None
            }
        };

        match (
            full(&self.requests, config.requests_per_minute),
            full(&self.tokens, config.tokens_per_minute),
        ) {
            (None, None) => None,
            (Some(a), None) | (None, Some(a)) => Some(a),
            (Some(a), Some(b)) => Some(a.max(b)),
        }
    }

    fn record(&mut self, now: Instant) {
        self.requests.push_back(now);
        self.tokens.push_back(now);
    }
}

/// Sliding-window rate limiter for one provider.
///
/// The window state is shared by every in-flight request to the provider and
/// guarded by a mutex that is never held across a sleep.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    window: Mutex<SlidingWindow>,
}

impl RateLimiter {
    /// Create a new rate limiter. Zero limits are raised to 1.
    pub fn new(mut config: RateLimiterConfig) -> Self {
        config.requests_per_minute = config.requests_per_minute.max(1);
        config.tokens_per_minute = config.tokens_per_minute.max(1);
        Self {
            config,
            window: Mutex::new(SlidingWindow::default()),
        }
    }

    /// Suspend until admission is safe, then record the admission.
    pub async fn admit(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                window.prune(now, self.config.window);
                match window.wait_time(now, &self.config) {
                    None => {
                        window.record(now);
                        return;
                    }
                    Some(wait) => wait,
                }
            };

            tracing::debug!(
                wait_ms = wait.as_millis() as u64,
                "Rate limited: waiting for window slot"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Admit without waiting. Returns `false` when the window is full.
    pub async fn try_admit(&self) -> bool {
        let mut window = self.window.lock().await;
        let now = Instant::now();
        window.prune(now, self.config.window);
        if window.wait_time(now, &self.config).is_some() {
            return false;
        }
        window.record(now);
        true
    }

    /// Current `(requests, tokens)` list lengths within the window.
    pub async fn in_window(&self) -> (usize, usize) {
        let mut window = self.window.lock().await;
        window.prune(Instant::now(), self.config.window);
        (window.requests.len(), window.tokens.len())
    }

    /// Get the configuration.
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}
