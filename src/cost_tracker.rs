//! Cost calculation from provider-reported usage.
//!
//! # Overview
//!
//! [`CostCalculator`] holds a static pricing table keyed by provider and model,
//! built once from [`crate::model_config::ModelsConfig`]. Prices are per 1000
//! tokens:
//!
//! ```text
//! cost = (prompt_tokens / 1000) * input_per_1k
//!      + (completion_tokens / 1000) * output_per_1k
//! ```
//!
//! Unknown models cost 0 so a completed request never fails on pricing.
//!
//! # Usage
//!
//! ```rust
//! use llm_orchestrator::cost_tracker::{CostCalculator, ModelPricing};
//! use llm_orchestrator::types::Usage;
//!
//! let mut costs = CostCalculator::new();
//! costs.set_pricing("openai", "gpt-4o-mini", ModelPricing::new(0.00015, 0.0006));
//!
//! let cost = costs.cost("openai", "gpt-4o-mini", &Usage::new(1000, 1000));
//! assert!((cost - 0.00075).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model_config::ModelsConfig;
use crate::types::Usage;

/// Pricing information for a model, in currency units per 1000 tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Cost per 1000 prompt tokens.
    pub input_per_1k: f64,

    /// Cost per 1000 completion tokens.
    pub output_per_1k: f64,
}

impl ModelPricing {
    /// Create new pricing with input and output costs.
    pub fn new(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }

    /// Calculate cost for the given usage. Never negative.
    pub fn calculate_cost(&self, usage: &Usage) -> f64 {
        let input_cost = (usage.prompt_tokens as f64 / 1000.0) * self.input_per_1k;
        let output_cost = (usage.completion_tokens as f64 / 1000.0) * self.output_per_1k;
        (input_cost + output_cost).max(0.0)
    }
}

/// Static per-provider, per-model pricing table.
#[derive(Debug, Clone, Default)]
pub struct CostCalculator {
    pricing: HashMap<String, HashMap<String, ModelPricing>>,
}

impl CostCalculator {
    /// Create an empty table. Every lookup costs 0 until prices are set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from the model cards of every configured provider.
    pub fn from_config(config: &ModelsConfig) -> Self {
        let mut calculator = Self::new();
        for provider in &config.providers {
            for model in &provider.models {
                calculator.set_pricing(
                    &provider.name,
                    &model.name,
                    ModelPricing::new(model.cost.input_per_1k, model.cost.output_per_1k),
                );
            }
        }
        calculator
    }

    /// Set pricing for a model.
    pub fn set_pricing(
        &mut self,
        provider: impl Into<String>,
        model: impl Into<String>,
        pricing: ModelPricing,
    ) {
        self.pricing
            .entry(provider.into())
            .or_default()
            .insert(model.into(), pricing);
    }

    /// Get pricing for a model.
    pub fn get_pricing(&self, provider: &str, model: &str) -> Option<&ModelPricing> {
        self.pricing.get(provider).and_then(|models| models.get(model))
    }

    /// Cost of `usage` on `provider`/`model`; 0 when the model is unpriced.
    pub fn cost(&self, provider: &str, model: &str, usage: &Usage) -> f64 {
        match self.get_pricing(provider, model) {
            Some(pricing) => pricing.calculate_cost(usage),
            None => {
                tracing::debug!(provider, model, "No pricing for model, cost recorded as 0");
                0.0
            }
        }
    }
}

/// Format cost in a human-readable way.
pub fn format_cost(cost: f64) -> String {
    if cost < 0.01 {
        format!("${:.4}", cost)
    } else if cost < 1.0 {
        format!("${:.3}", cost)
    } else {
        format!("${:.2}", cost)
    }
}
