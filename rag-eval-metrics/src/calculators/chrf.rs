use async_trait::async_trait;
use rag_eval_core::{
    ChrfConfig, EvaluationInput, MetricKind, MetricValue, Result, Scorer, TextNormalizer,
};

use super::{clipped_overlap, ngram_counts};

/// Character n-gram F-score (chrF), whitespace ignored.
#[derive(Debug, Clone)]
pub struct ChrfCalculator {
    pub max_char_n: usize,
    pub beta: f64,
    normalizer: TextNormalizer,
}

impl ChrfCalculator {
    pub fn new(max_char_n: usize, beta: f64) -> Self {
        Self {
            max_char_n: max_char_n.max(1),
            beta,
            normalizer: TextNormalizer::default(),
        }
    }

    pub fn from_config(config: &ChrfConfig) -> Self {
        Self::new(config.max_char_n, config.beta)
    }

    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Average precision and recall over the orders both texts can form.
    fn average_precision_recall(&self, hyp: &[char], refs: &[char]) -> Option<(f64, f64)> {
        let mut precision_sum = 0.0;
        let mut recall_sum = 0.0;
        let mut orders = 0usize;

        for n in 1..=self.max_char_n {
            if hyp.len() < n || refs.len() < n {
                break;
            }
            let hyp_counts = ngram_counts(hyp, n);
            let ref_counts = ngram_counts(refs, n);
            let matches = clipped_overlap(&hyp_counts, &ref_counts) as f64;

            precision_sum += matches / (hyp.len() - n + 1) as f64;
            recall_sum += matches / (refs.len() - n + 1) as f64;
            orders += 1;
        }

        (orders > 0).then(|| (precision_sum / orders as f64, recall_sum / orders as f64))
    }

    /// chrF in [0, 1]
    pub fn calculate_chrf(&self, predicted: &str, reference: &str) -> f64 {
        let hyp = self.normalizer.characters(predicted);
        let refs = self.normalizer.characters(reference);

        let Some((precision, recall)) = self.average_precision_recall(&hyp, &refs) else {
            return 0.0;
        };
        if precision + recall <= 0.0 {
            return 0.0;
        }

        let beta_sq = self.beta * self.beta;
        ((1.0 + beta_sq) * precision * recall / (beta_sq * precision + recall)).clamp(0.0, 1.0)
    }
}

impl Default for ChrfCalculator {
    fn default() -> Self {
        Self::new(6, 3.0)
    }
}

#[async_trait]
impl Scorer for ChrfCalculator {
    fn kind(&self) -> MetricKind {
        MetricKind::Chrf
    }

    async fn score(&self, input: &EvaluationInput) -> Result<MetricValue> {
        Ok(MetricValue::Score(
            self.calculate_chrf(input.response(), input.reference()),
        ))
    }
}
