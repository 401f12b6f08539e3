//! Provider and model configuration.
//!
//! TOML-based description of every provider the orchestrator can dispatch to:
//! model cards (context window, output cap, streaming, pricing), rate limits,
//! dispatch timeout and the ordered fallback chain. Global `[cache]` and
//! `[fallback]` tables tune the response cache and cross-provider fallback.
//!
//! # Configuration File Location
//!
//! The config file is loaded from (in order of priority):
//! 1. `LLM_ORCHESTRATOR_CONFIG` environment variable
//! 2. `./orchestrator.toml` (current working directory)
//! 3. `<config dir>/llm-orchestrator/orchestrator.toml` (user config)
//! 4. Built-in default configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 3600
//!
//! [fallback]
//! model_policy = "equivalence_map"
//!
//! [[providers]]
//! name = "openai"
//! display_name = "OpenAI"
//! timeout_seconds = 60
//! fallback = ["anthropic"]
//!
//! [providers.rate_limit]
//! requests_per_minute = 500
//! tokens_per_minute = 150000
//!
//! [[providers.models]]
//! name = "gpt-4o-mini"
//! context_length = 128000
//! max_output_tokens = 16384
//!
//! [providers.models.cost]
//! input_per_1k = 0.00015
//! output_per_1k = 0.0006
//!
//! [providers.models.equivalents]
//! anthropic = "claude-3-haiku"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::cache::CacheConfig;
use crate::rate_limiter::RateLimiterConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "LLM_ORCHESTRATOR_CONFIG";

/// Config file name searched in the working and user config directories.
pub const CONFIG_FILE_NAME: &str = "orchestrator.toml";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ModelConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    ParseError(String),

    /// Invalid configuration (missing required fields, invalid values).
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Provider not found in configuration.
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Global Settings
// ============================================================================

/// `[cache]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Entry lifetime in seconds.
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,

    /// Capacity of the in-memory store.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_max_entries() -> usize {
    1000
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: default_cache_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheSettings {
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.max_entries)
            .with_ttl(Duration::from_secs(self.ttl_seconds))
            .with_enabled(self.enabled)
    }
}

/// How the model id is chosen when a request falls back to another provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackModelPolicy {
    /// Map through the origin model's `equivalents`. Candidates without a
    /// mapping are skipped as failed.
    #[default]
    EquivalenceMap,
    /// Keep the model id unchanged; it must exist on the fallback provider.
    Preserve,
}

/// `[fallback]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackSettings {
    /// Master switch for cross-provider fallback.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub model_policy: FallbackModelPolicy,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model_policy: FallbackModelPolicy::default(),
        }
    }
}

// ============================================================================
// Model Card
// ============================================================================

/// Cost information for a model (per 1000 tokens).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelCost {
    /// Cost per 1000 input tokens.
    #[serde(default)]
    pub input_per_1k: f64,

    /// Cost per 1000 output tokens.
    #[serde(default)]
    pub output_per_1k: f64,
}

/// One model served by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCard {
    /// Provider-specific model id (e.g., "gpt-4o-mini").
    pub name: String,

    /// Human-readable display name.
    #[serde(default)]
    pub display_name: String,

    /// Maximum prompt plus completion tokens.
    #[serde(default = "default_context_length")]
    pub context_length: usize,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: usize,

    #[serde(default = "default_true")]
    pub supports_streaming: bool,

    #[serde(default)]
    pub cost: ModelCost,

    /// Equivalent model per fallback provider id.
    #[serde(default)]
    pub equivalents: BTreeMap<String, String>,
}

fn default_context_length() -> usize {
    4096
}

fn default_max_output_tokens() -> usize {
    4096
}

impl ModelCard {
    /// Create a card with default limits and zero cost.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            context_length: default_context_length(),
            max_output_tokens: default_max_output_tokens(),
            supports_streaming: true,
            cost: ModelCost::default(),
            equivalents: BTreeMap::new(),
        }
    }

    pub fn with_context_length(mut self, context_length: usize) -> Self {
        self.context_length = context_length;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: usize) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_streaming(mut self, supports_streaming: bool) -> Self {
        self.supports_streaming = supports_streaming;
        self
    }

    pub fn with_cost(mut self, input_per_1k: f64, output_per_1k: f64) -> Self {
        self.cost = ModelCost {
            input_per_1k,
            output_per_1k,
        };
        self
    }

    /// Declare the equivalent model on another provider.
    pub fn with_equivalent(mut self, provider: impl Into<String>, model: impl Into<String>) -> Self {
        self.equivalents.insert(provider.into(), model.into());
        self
    }

    /// Equivalent model id on `provider`, if declared.
    pub fn equivalent_on(&self, provider: &str) -> Option<&str> {
        self.equivalents.get(provider).map(String::as_str)
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// `[providers.rate_limit]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_rpm")]
    pub requests_per_minute: usize,

    #[serde(default = "default_tpm")]
    pub tokens_per_minute: usize,

    #[serde(default = "default_window")]
    pub window_seconds: u64,
}

fn default_rpm() -> usize {
    60
}

fn default_tpm() -> usize {
    90_000
}

fn default_window() -> u64 {
    60
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            requests_per_minute: default_rpm(),
            tokens_per_minute: default_tpm(),
            window_seconds: default_window(),
        }
    }
}

impl RateLimitSettings {
    pub fn new(requests_per_minute: usize, tokens_per_minute: usize) -> Self {
        Self {
            requests_per_minute,
            tokens_per_minute,
            window_seconds: default_window(),
        }
    }

    pub fn to_limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig::new(self.requests_per_minute, self.tokens_per_minute)
            .with_window(Duration::from_secs(self.window_seconds))
    }
}

/// Configuration for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique provider identifier (e.g., "openai").
    pub name: String,

    /// Human-readable display name.
    #[serde(default)]
    pub display_name: String,

    /// Dispatch timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Ordered fallback provider ids.
    #[serde(default)]
    pub fallback: Vec<String>,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    /// List of available models for this provider.
    #[serde(default)]
    pub models: Vec<ModelCard>,
}

fn default_timeout() -> u64 {
    60
}

impl ProviderConfig {
    /// Create a provider with default limits, no models and no fallback.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            timeout_seconds: default_timeout(),
            fallback: Vec::new(),
            rate_limit: RateLimitSettings::default(),
            models: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_fallback<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback = providers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitSettings) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_model(mut self, model: ModelCard) -> Self {
        self.models.push(model);
        self
    }

    /// Get a model card by id.
    pub fn model(&self, name: &str) -> Option<&ModelCard> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub fallback: FallbackSettings,

    /// List of configured providers.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

impl ModelsConfig {
    /// Load configuration from the default location.
    ///
    /// Searches in order:
    /// 1. `LLM_ORCHESTRATOR_CONFIG` environment variable
    /// 2. `./orchestrator.toml`
    /// 3. `<config dir>/llm-orchestrator/orchestrator.toml`
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ModelConfigError> {
        match Self::locate() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading orchestrator config");
                Self::from_file(&path)
            }
            None => Ok(Self::builtin_defaults()),
        }
    }

    /// First existing config file in search order.
    pub fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            tracing::warn!(
                path = %path.display(),
                "{} points to a missing file, ignoring",
                CONFIG_ENV_VAR
            );
        }

        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        dirs::config_dir()
            .map(|dir| dir.join("llm-orchestrator").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    /// Load and validate configuration from a specific file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ModelConfigError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ModelConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml(&self) -> Result<String, ModelConfigError> {
        toml::to_string_pretty(self).map_err(|e| ModelConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelConfigError> {
        let toml_str = self.to_toml()?;
        std::fs::write(path.as_ref(), toml_str)?;
        Ok(())
    }

    /// Get built-in default configuration with common providers.
    pub fn builtin_defaults() -> Self {
        let openai = ProviderConfig::new("openai")
            .with_display_name("OpenAI")
            .with_fallback(["anthropic", "google"])
            .with_rate_limit(RateLimitSettings::new(500, 150_000))
            .with_model(
                ModelCard::new("gpt-4o")
                    .with_context_length(128_000)
                    .with_max_output_tokens(16_384)
                    .with_cost(0.0025, 0.01)
                    .with_equivalent("anthropic", "claude-3-5-sonnet")
                    .with_equivalent("google", "gemini-1.5-pro"),
            )
            .with_model(
                ModelCard::new("gpt-4o-mini")
                    .with_context_length(128_000)
                    .with_max_output_tokens(16_384)
                    .with_cost(0.00015, 0.0006)
                    .with_equivalent("anthropic", "claude-3-haiku")
                    .with_equivalent("google", "gemini-1.5-flash"),
            )
            .with_model(
                ModelCard::new("gpt-3.5-turbo")
                    .with_context_length(16_385)
                    .with_max_output_tokens(4096)
                    .with_cost(0.0005, 0.0015)
                    .with_equivalent("anthropic", "claude-3-haiku")
                    .with_equivalent("google", "gemini-1.5-flash"),
            );

        let anthropic = ProviderConfig::new("anthropic")
            .with_display_name("Anthropic")
            .with_fallback(["openai", "google"])
            .with_rate_limit(RateLimitSettings::new(50, 40_000))
            .with_model(
                ModelCard::new("claude-3-5-sonnet")
                    .with_context_length(200_000)
                    .with_max_output_tokens(8192)
                    .with_cost(0.003, 0.015)
                    .with_equivalent("openai", "gpt-4o")
                    .with_equivalent("google", "gemini-1.5-pro"),
            )
            .with_model(
                ModelCard::new("claude-3-haiku")
                    .with_context_length(200_000)
                    .with_max_output_tokens(4096)
                    .with_cost(0.00025, 0.00125)
                    .with_equivalent("openai", "gpt-4o-mini")
                    .with_equivalent("google", "gemini-1.5-flash"),
            );

        let google = ProviderConfig::new("google")
            .with_display_name("Google AI")
            .with_fallback(["openai", "anthropic"])
            .with_rate_limit(RateLimitSettings::new(360, 120_000))
            .with_model(
                ModelCard::new("gemini-1.5-pro")
                    .with_context_length(2_000_000)
                    .with_max_output_tokens(8192)
                    .with_cost(0.00125, 0.005)
                    .with_equivalent("openai", "gpt-4o")
                    .with_equivalent("anthropic", "claude-3-5-sonnet"),
            )
            .with_model(
                ModelCard::new("gemini-1.5-flash")
                    .with_context_length(1_000_000)
                    .with_max_output_tokens(8192)
                    .with_cost(0.000075, 0.0003)
                    .with_equivalent("openai", "gpt-4o-mini")
                    .with_equivalent("anthropic", "claude-3-haiku"),
            );

        let local = ProviderConfig::new("local")
            .with_display_name("Local")
            .with_timeout(120)
            .with_rate_limit(RateLimitSettings::new(60, 90_000))
            .with_model(
                ModelCard::new("llama3")
                    .with_context_length(8192)
                    .with_max_output_tokens(2048),
            );

        Self {
            cache: CacheSettings::default(),
            fallback: FallbackSettings::default(),
            providers: vec![openai, anthropic, google, local],
        }
    }

    /// Get a provider by name.
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Get a model by provider and model name.
    pub fn get_model(&self, provider: &str, model: &str) -> Option<&ModelCard> {
        self.get_provider(provider).and_then(|p| p.model(model))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ModelConfigError> {
        let invalid = |msg: String| -> Result<(), ModelConfigError> {
            Err(ModelConfigError::ValidationError(msg))
        };

        // Check for duplicate provider names
        let mut seen_providers = HashSet::new();
        for provider in &self.providers {
            if provider.name.is_empty() {
                return invalid("Provider with empty name".to_string());
            }
            if !seen_providers.insert(provider.name.as_str()) {
                return invalid(format!("Duplicate provider name: '{}'", provider.name));
            }
        }

        for provider in &self.providers {
            let limits = &provider.rate_limit;
            if limits.requests_per_minute == 0
                || limits.tokens_per_minute == 0
                || limits.window_seconds == 0
            {
                return invalid(format!(
                    "Provider '{}' has a zero rate limit or window",
                    provider.name
                ));
            }

            if provider.timeout_seconds == 0 {
                return invalid(format!("Provider '{}' has a zero timeout", provider.name));
            }

            let mut seen_fallback = HashSet::new();
            for candidate in &provider.fallback {
                if candidate == &provider.name {
                    return invalid(format!(
                        "Provider '{}' lists itself as a fallback",
                        provider.name
                    ));
                }
                if !seen_providers.contains(candidate.as_str()) {
                    return invalid(format!(
                        "Provider '{}' falls back to unknown provider '{}'",
                        provider.name, candidate
                    ));
                }
                if !seen_fallback.insert(candidate.as_str()) {
                    return invalid(format!(
                        "Provider '{}' lists fallback '{}' twice",
                        provider.name, candidate
                    ));
                }
            }

            // Check for duplicate model names within a provider
            let mut seen_models = HashSet::new();
            for model in &provider.models {
                if !seen_models.insert(model.name.as_str()) {
                    return invalid(format!(
                        "Duplicate model name '{}' in provider '{}'",
                        model.name, provider.name
                    ));
                }
                if model.context_length == 0 {
                    return invalid(format!(
                        "Model '{}' in provider '{}' has a zero context length",
                        model.name, provider.name
                    ));
                }
                for (target, equivalent) in &model.equivalents {
                    if self.get_model(target, equivalent).is_none() {
                        return invalid(format!(
                            "Model '{}/{}' maps to unknown model '{}/{}'",
                            provider.name, model.name, target, equivalent
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const MINIMAL: &str = r#"
[[providers]]
name = "primary"
fallback = ["secondary"]

[[providers.models]]
name = "big"
context_length = 1000

[providers.models.cost]
input_per_1k = 0.01
output_per_1k = 0.02

[providers.models.equivalents]
secondary = "small"

[[providers]]
name = "secondary"

[providers.rate_limit]
requests_per_minute = 2

[[providers.models]]
name = "small"
supports_streaming = false
"#;

    #[test]
    fn test_builtin_defaults() {
        let config = ModelsConfig::builtin_defaults();
        assert!(config.validate().is_ok());
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_seconds, 3600);
        assert_eq!(
            config.get_provider("openai").unwrap().fallback,
            vec!["anthropic", "google"]
        );
        assert_eq!(
            config
                .get_model("openai", "gpt-4o-mini")
                .unwrap()
                .equivalent_on("anthropic"),
            Some("claude-3-haiku")
        );
    }

    #[test]
    fn test_parse_minimal_with_defaults() {
        let config = ModelsConfig::from_toml(MINIMAL).unwrap();

        let primary = config.get_provider("primary").unwrap();
        assert_eq!(primary.timeout_seconds, 60);
        assert_eq!(primary.rate_limit, RateLimitSettings::default());

        let secondary = config.get_provider("secondary").unwrap();
        assert_eq!(secondary.rate_limit.requests_per_minute, 2);
        assert_eq!(secondary.rate_limit.window_seconds, 60);

        let small = config.get_model("secondary", "small").unwrap();
        assert!(!small.supports_streaming);
        assert_eq!(small.context_length, 4096);

        assert_eq!(config.fallback.model_policy, FallbackModelPolicy::EquivalenceMap);
    }

    #[test]
    fn test_model_policy_parsing() {
        let toml = format!("[fallback]\nmodel_policy = \"preserve\"\n{}", MINIMAL);
        let config = ModelsConfig::from_toml(&toml).unwrap();
        assert_eq!(config.fallback.model_policy, FallbackModelPolicy::Preserve);
        assert!(config.fallback.enabled);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ModelsConfig::builtin_defaults();
        let toml = config.to_toml().unwrap();
        let parsed = ModelsConfig::from_toml(&toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation_duplicate_provider() {
        let mut config = ModelsConfig::builtin_defaults();
        config.providers.push(config.providers[0].clone());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_fallback() {
        let mut config = ModelsConfig::builtin_defaults();
        config.providers[0].fallback = vec!["nowhere".into()];
        assert!(config.validate().is_err());

        let mut config = ModelsConfig::builtin_defaults();
        config.providers[0].fallback = vec!["openai".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        let mut config = ModelsConfig::builtin_defaults();
        config.providers[1].rate_limit.requests_per_minute = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("zero rate limit"));
    }

    #[test]
    fn test_validation_rejects_dangling_equivalent() {
        let mut config = ModelsConfig::builtin_defaults();
        config.providers[0].models[0]
            .equivalents
            .insert("google".into(), "gemini-0".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_invalid() {
        assert!(matches!(
            ModelsConfig::from_toml("providers = 3"),
            Err(ModelConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_from_toml_empty() {
        let config = ModelsConfig::from_toml("").unwrap();
        assert!(config.providers.is_empty());
        assert!(config.fallback.enabled);
    }

    #[test]
    fn test_settings_conversion() {
        let settings = RateLimitSettings {
            requests_per_minute: 5,
            tokens_per_minute: 10,
            window_seconds: 30,
        };
        let limiter = settings.to_limiter_config();
        assert_eq!(limiter.requests_per_minute, 5);
        assert_eq!(limiter.window, Duration::from_secs(30));

        let cache = CacheSettings {
            enabled: false,
            ttl_seconds: 5,
            max_entries: 3,
        }
        .to_cache_config();
        assert!(!cache.enabled);
        assert_eq!(cache.ttl, Duration::from_secs(5));
        assert_eq!(cache.max_entries, 3);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orchestrator.toml");

        let config = ModelsConfig::builtin_defaults();
        config.save(&path).unwrap();
        assert_eq!(ModelsConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    #[serial]
    fn test_load_from_env_var() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        std::env::set_var(CONFIG_ENV_VAR, file.path());
        let config = ModelsConfig::load();
        std::env::remove_var(CONFIG_ENV_VAR);

        let config = config.unwrap();
        assert!(config.get_provider("primary").is_some());
    }

    #[test]
    #[serial]
    fn test_load_ignores_missing_env_file() {
        std::env::set_var(CONFIG_ENV_VAR, "/definitely/not/here.toml");
        let located = ModelsConfig::locate();
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_ne!(located, Some(PathBuf::from("/definitely/not/here.toml")));
    }
}
