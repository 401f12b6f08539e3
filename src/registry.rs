//! Provider Registry
//!
//! Joins each [`ProviderAdapter`] with its configuration (model cards, rate
//! limits, timeout, fallback chain) and the [`RateLimiter`] built from that
//! configuration.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ProviderRegistry                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  openai    ─► adapter, ProviderConfig, RateLimiter           │
//! │  anthropic ─► adapter, ProviderConfig, RateLimiter           │
//! │  google    ─► adapter, ProviderConfig, RateLimiter           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The registry is built once and owned by the orchestrator. Only the rate
//! limiter inside each entry is mutated afterwards.
//!
//! # Example
//!
//! ```ignore
//! use llm_orchestrator::registry::ProviderRegistry;
//!
//! let config = ModelsConfig::load()?;
//! let registry = ProviderRegistry::from_config(&config, vec![openai, anthropic])?;
//! assert!(registry.has("openai"));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::model_config::{ModelCard, ModelConfigError, ModelsConfig, ProviderConfig};
use crate::rate_limiter::RateLimiter;
use crate::traits::ProviderAdapter;

/// One registered provider.
#[derive(Clone)]
pub struct ProviderEntry {
    adapter: Arc<dyn ProviderAdapter>,
    config: ProviderConfig,
    limiter: Arc<RateLimiter>,
}

impl ProviderEntry {
    pub fn new(config: ProviderConfig, adapter: Arc<dyn ProviderAdapter>) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.to_limiter_config()));
        Self {
            adapter,
            config,
            limiter,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn adapter(&self) -> &Arc<dyn ProviderAdapter> {
        &self.adapter
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Model card by id.
    pub fn model(&self, name: &str) -> Option<&ModelCard> {
        self.config.model(name)
    }

    /// Ordered fallback provider ids.
    pub fn fallback(&self) -> &[String] {
        &self.config.fallback
    }
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("adapter", &self.adapter.name())
            .field("config", &self.config)
            .finish()
    }
}

/// Static mapping from provider id to [`ProviderEntry`].
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    entries: HashMap<String, ProviderEntry>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configuration and adapters.
    ///
    /// Adapters are matched to providers by [`ProviderAdapter::name`]. An
    /// adapter without a configured provider is an error. Configured
    /// providers without an adapter are left out and fail validation when
    /// requested.
    pub fn from_config(
        config: &ModelsConfig,
        adapters: impl IntoIterator<Item = Arc<dyn ProviderAdapter>>,
    ) -> Result<Self, ModelConfigError> {
        let mut registry = Self::new();
        for adapter in adapters {
            let provider = config
                .get_provider(adapter.name())
                .ok_or_else(|| ModelConfigError::ProviderNotFound(adapter.name().to_string()))?;
            registry.register(provider.clone(), adapter);
        }

        for provider in &config.providers {
            if !registry.has(&provider.name) {
                tracing::debug!(provider = %provider.name, "No adapter registered for provider");
            }
        }

        Ok(registry)
    }

    /// Register a provider, replacing any previous entry with the same name.
    pub fn register(&mut self, config: ProviderConfig, adapter: Arc<dyn ProviderAdapter>) {
        let name = config.name.clone();
        tracing::debug!(provider = %name, models = config.models.len(), "Registering provider");
        self.entries.insert(name, ProviderEntry::new(config, adapter));
    }

    /// Get a provider entry by name.
    pub fn get(&self, name: &str) -> Option<&ProviderEntry> {
        self.entries.get(name)
    }

    /// Get a model card by provider and model id.
    pub fn model(&self, provider: &str, model: &str) -> Option<&ModelCard> {
        self.get(provider).and_then(|entry| entry.model(model))
    }

    /// Check if a provider is registered.
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Remove a provider.
    pub fn remove(&mut self, name: &str) -> Option<ProviderEntry> {
        self.entries.remove(name)
    }

    /// Registered provider ids, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
