use async_trait::async_trait;
use rag_eval_core::{
    EvalError, EvaluationInput, LanguageModelBackend, MetricKind, MetricValue, Result, Scorer,
};

use crate::models::LazyModel;

#[derive(Debug, Clone)]
pub struct PerplexityCalculator {
    pub base: f64,
}

impl PerplexityCalculator {
    pub fn new() -> Self {
        Self { base: std::f64::consts::E }
    }

    pub fn with_base(mut self, base: f64) -> Self {
        self.base = base;
        self
    }

    /// Calculate perplexity from log probabilities
    /// Perplexity = base^(average negative log likelihood)
    ///
    /// Returns `(perplexity, cross_entropy)`.
    pub fn calculate_perplexity(&self, log_probs: &[f64]) -> Result<(f64, f64)> {
        if log_probs.is_empty() {
            return Err(EvalError::EmptyInput(
                "cannot calculate perplexity without token log probabilities".to_string(),
            ));
        }
        if let Some(bad) = log_probs.iter().find(|lp| !lp.is_finite() || **lp > 0.0) {
            return Err(EvalError::Computation(format!(
                "invalid token log probability: {}",
                bad
            )));
        }

        let sum_log_probs: f64 = log_probs.iter().sum();
        let cross_entropy = -sum_log_probs / log_probs.len() as f64;

        let perplexity = if self.base == std::f64::consts::E {
            cross_entropy.exp()
        } else if self.base == 2.0 {
            2_f64.powf(cross_entropy)
        } else {
            self.base.powf(cross_entropy)
        };

        if !perplexity.is_finite() {
            return Err(EvalError::Computation(format!(
                "perplexity overflowed for cross entropy {}",
                cross_entropy
            )));
        }

        Ok((perplexity, cross_entropy))
    }

    /// Calculate perplexity from raw probabilities (converts to log probs)
    pub fn calculate_from_probs(&self, probs: &[f64]) -> Result<(f64, f64)> {
        if probs.is_empty() {
            return Err(EvalError::EmptyInput(
                "cannot calculate perplexity without token probabilities".to_string(),
            ));
        }

        let log_probs: Vec<f64> = probs
            .iter()
            .map(|&p| {
                if p <= 0.0 {
                    -1000.0
                } else if self.base == std::f64::consts::E {
                    p.ln()
                } else if self.base == 2.0 {
                    p.log2()
                } else {
                    p.log(self.base)
                }
            })
            .collect();

        self.calculate_perplexity(&log_probs)
    }
}

impl Default for PerplexityCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Perplexity of the response under a causal language model.
#[derive(Debug, Clone)]
pub struct FluencyScorer {
    model: LazyModel<dyn LanguageModelBackend>,
    calculator: PerplexityCalculator,
}

impl FluencyScorer {
    pub fn new(model: LazyModel<dyn LanguageModelBackend>) -> Self {
        Self {
            model,
            calculator: PerplexityCalculator::new(),
        }
    }

    pub async fn perplexity(&self, text: &str) -> Result<f64> {
        if text.trim().is_empty() {
            return Err(EvalError::EmptyInput("perplexity of empty text".to_string()));
        }
        let backend = self.model.get().await?;
        let log_probs = backend.log_likelihood(text).await?;
        tracing::debug!(
            model = backend.model_id(),
            tokens = log_probs.len(),
            "Scored token log likelihoods"
        );

        let (perplexity, _) = self.calculator.calculate_perplexity(&log_probs)?;
        Ok(perplexity)
    }
}

#[async_trait]
impl Scorer for FluencyScorer {
    fn kind(&self) -> MetricKind {
        MetricKind::Perplexity
    }

    async fn score(&self, input: &EvaluationInput) -> Result<MetricValue> {
        Ok(MetricValue::Score(self.perplexity(input.response()).await?))
    }
}
