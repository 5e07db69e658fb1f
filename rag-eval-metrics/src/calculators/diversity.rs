use async_trait::async_trait;
use rag_eval_core::{EvaluationInput, MetricKind, MetricValue, Result, Scorer, TextNormalizer};

use super::ngram_counts;

/// Distinct-2: unique token bigrams over all token bigrams of the response.
#[derive(Debug, Clone, Default)]
pub struct DiversityScorer {
    normalizer: TextNormalizer,
}

impl DiversityScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// 0.0 for texts with fewer than two tokens.
    pub fn diversity(&self, text: &str) -> f64 {
        let tokens = self.normalizer.tokenize(text);
        if tokens.len() < 2 {
            return 0.0;
        }
        let distinct = ngram_counts(&tokens, 2).len();
        distinct as f64 / (tokens.len() - 1) as f64
    }
}

#[async_trait]
impl Scorer for DiversityScorer {
    fn kind(&self) -> MetricKind {
        MetricKind::Diversity
    }

    async fn score(&self, input: &EvaluationInput) -> Result<MetricValue> {
        Ok(MetricValue::Score(self.diversity(input.response())))
    }
}
