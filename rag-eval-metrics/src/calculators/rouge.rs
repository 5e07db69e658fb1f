use async_trait::async_trait;
use rag_eval_core::{
    EvaluationInput, MetricKind, MetricValue, PrecisionRecallF1, Result, Scorer, TextNormalizer,
};
use serde::{Deserialize, Serialize};

use super::{clipped_overlap, ngram_counts};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RougeVariant {
    Rouge1,
    Rouge2,
    RougeL,
}

/// ROUGE F-measure over alphanumeric words, optionally stemmed.
#[derive(Debug, Clone)]
pub struct RougeCalculator {
    pub variant: RougeVariant,
    pub use_stemmer: bool,
    normalizer: TextNormalizer,
}

impl RougeCalculator {
    pub fn new(variant: RougeVariant) -> Self {
        Self {
            variant,
            use_stemmer: true,
            normalizer: TextNormalizer::default(),
        }
    }

    pub fn rouge_1() -> Self {
        Self::new(RougeVariant::Rouge1)
    }

    pub fn rouge_2() -> Self {
        Self::new(RougeVariant::Rouge2)
    }

    pub fn rouge_l() -> Self {
        Self::new(RougeVariant::RougeL)
    }

    pub fn with_stemmer(mut self, use_stemmer: bool) -> Self {
        self.use_stemmer = use_stemmer;
        self
    }

    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    fn words(&self, text: &str) -> Vec<String> {
        let words = self.normalizer.words(text);
        if self.use_stemmer {
            words.iter().map(|w| self.normalizer.stem(w)).collect()
        } else {
            words
        }
    }

    /// Calculate ROUGE-N precision, recall and F1
    fn rouge_n(&self, pred_words: &[String], ref_words: &[String], n: usize) -> PrecisionRecallF1 {
        let pred_counts = ngram_counts(pred_words, n);
        let ref_counts = ngram_counts(ref_words, n);

        let pred_total: usize = pred_counts.values().sum();
        let ref_total: usize = ref_counts.values().sum();
        if pred_total == 0 || ref_total == 0 {
            return PrecisionRecallF1::new(0.0, 0.0);
        }

        let overlap = clipped_overlap(&ref_counts, &pred_counts);
        PrecisionRecallF1::new(
            overlap as f64 / pred_total as f64,
            overlap as f64 / ref_total as f64,
        )
    }

    /// Calculate longest common subsequence length
    fn lcs_length(&self, text1: &[String], text2: &[String]) -> usize {
        let m = text1.len();
        let n = text2.len();

        if m == 0 || n == 0 {
            return 0;
        }

        let mut dp = vec![vec![0; n + 1]; m + 1];

        for i in 1..=m {
            for j in 1..=n {
                if text1[i - 1] == text2[j - 1] {
                    dp[i][j] = dp[i - 1][j - 1] + 1;
                } else {
                    dp[i][j] = dp[i - 1][j].max(dp[i][j - 1]);
                }
            }
        }

        dp[m][n]
    }

    fn rouge_lcs(&self, pred_words: &[String], ref_words: &[String]) -> PrecisionRecallF1 {
        if pred_words.is_empty() || ref_words.is_empty() {
            return PrecisionRecallF1::new(0.0, 0.0);
        }

        let lcs_len = self.lcs_length(pred_words, ref_words);
        PrecisionRecallF1::new(
            lcs_len as f64 / pred_words.len() as f64,
            lcs_len as f64 / ref_words.len() as f64,
        )
    }

    /// Precision, recall and F1 of `predicted` against `reference`.
    pub fn calculate(&self, predicted: &str, reference: &str) -> PrecisionRecallF1 {
        let pred_words = self.words(predicted);
        let ref_words = self.words(reference);

        match self.variant {
            RougeVariant::Rouge1 => self.rouge_n(&pred_words, &ref_words, 1),
            RougeVariant::Rouge2 => self.rouge_n(&pred_words, &ref_words, 2),
            RougeVariant::RougeL => self.rouge_lcs(&pred_words, &ref_words),
        }
    }
}

impl Default for RougeCalculator {
    fn default() -> Self {
        Self::rouge_1()
    }
}

#[async_trait]
impl Scorer for RougeCalculator {
    fn kind(&self) -> MetricKind {
        match self.variant {
            RougeVariant::Rouge1 => MetricKind::Rouge1,
            RougeVariant::Rouge2 => MetricKind::Rouge2,
            RougeVariant::RougeL => MetricKind::RougeL,
        }
    }

    async fn score(&self, input: &EvaluationInput) -> Result<MetricValue> {
        let scores = self.calculate(input.response(), input.reference());
        Ok(MetricValue::Score(scores.f1))
    }
}
