use async_trait::async_trait;
use rag_eval_core::{
    BleuConfig, EvaluationInput, MetricKind, MetricValue, Result, Scorer, SmoothingMethod,
    TextNormalizer,
};

use super::{clipped_overlap, ngram_counts};

/// Corpus-style BLEU over a single response/reference pair.
///
/// [`calculate_bleu`](Self::calculate_bleu) works in [0, 1]; the reported
/// `bleu` metric is scaled to [0, 100].
#[derive(Debug, Clone)]
pub struct BleuCalculator {
    pub max_n: usize,
    pub smoothing: SmoothingMethod,
    normalizer: TextNormalizer,
}

impl BleuCalculator {
    pub fn new(max_n: usize) -> Self {
        Self {
            max_n: max_n.max(1),
            smoothing: SmoothingMethod::default(),
            normalizer: TextNormalizer::default(),
        }
    }

    pub fn from_config(config: &BleuConfig) -> Self {
        Self::new(config.max_n).with_smoothing(config.smoothing)
    }

    pub fn with_smoothing(mut self, smoothing: SmoothingMethod) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Clipped matches and total candidate n-grams for order `n`
    fn modified_precision(&self, predicted: &[String], reference: &[String], n: usize) -> (usize, usize) {
        let pred_counts = ngram_counts(predicted, n);
        let ref_counts = ngram_counts(reference, n);

        let total: usize = pred_counts.values().sum();
        (clipped_overlap(&pred_counts, &ref_counts), total)
    }

    /// Calculate brevity penalty
    fn brevity_penalty(&self, predicted_len: usize, reference_len: usize) -> f64 {
        if predicted_len > reference_len {
            1.0
        } else if reference_len == 0 || predicted_len == 0 {
            1.0
        } else {
            (1.0 - (reference_len as f64 / predicted_len as f64)).exp()
        }
    }

    /// BLEU in [0, 1] together with the per-order precisions.
    ///
    /// Orders longer than the response are left out of the geometric mean
    /// and reported as 0.0. No unigram overlap always scores 0.
    pub fn calculate_bleu(&self, predicted: &str, reference: &str) -> (f64, Vec<f64>) {
        let pred_tokens = self.normalizer.tokenize(predicted);
        let ref_tokens = self.normalizer.tokenize(reference);

        let mut precisions = vec![0.0; self.max_n];
        if pred_tokens.is_empty() || ref_tokens.is_empty() {
            return (0.0, precisions);
        }

        let mut log_precision_sum = 0.0;
        let mut orders = 0usize;
        let mut exp_denominator = 1.0;

        for n in 1..=self.max_n {
            let (clipped, total) = self.modified_precision(&pred_tokens, &ref_tokens, n);
            if total == 0 {
                break;
            }
            if n == 1 && clipped == 0 {
                return (0.0, precisions);
            }

            let precision = match self.smoothing {
                SmoothingMethod::None => clipped as f64 / total as f64,
                SmoothingMethod::Add1 => (clipped as f64 + 1.0) / (total as f64 + 1.0),
                SmoothingMethod::Add01 => (clipped as f64 + 0.1) / (total as f64 + 0.1),
                SmoothingMethod::Exponential if clipped == 0 => {
                    exp_denominator *= 2.0;
                    1.0 / (exp_denominator * total as f64)
                }
                SmoothingMethod::Exponential => clipped as f64 / total as f64,
            };

            precisions[n - 1] = precision;
            if precision > 0.0 {
                log_precision_sum += precision.ln();
                orders += 1;
            } else {
                // Unsmoothed zero precision zeroes the geometric mean
                return (0.0, precisions);
            }
        }

        let geometric_mean = (log_precision_sum / orders as f64).exp();
        let bp = self.brevity_penalty(pred_tokens.len(), ref_tokens.len());
        let bleu = (bp * geometric_mean).clamp(0.0, 1.0);

        (bleu, precisions)
    }
}

impl Default for BleuCalculator {
    fn default() -> Self {
        Self::new(4)
    }
}

#[async_trait]
impl Scorer for BleuCalculator {
    fn kind(&self) -> MetricKind {
        MetricKind::Bleu
    }

    async fn score(&self, input: &EvaluationInput) -> Result<MetricValue> {
        let (bleu, _) = self.calculate_bleu(input.response(), input.reference());
        Ok(MetricValue::Score(bleu * 100.0))
    }
}
