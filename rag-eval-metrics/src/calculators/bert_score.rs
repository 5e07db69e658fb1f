use async_trait::async_trait;
use rag_eval_core::{
    EmbeddingBackend, EvalError, EvaluationInput, MetricKind, MetricValue, PrecisionRecallF1,
    Result, Scorer, TextNormalizer,
};

use super::cosine_similarity;
use crate::models::LazyModel;

/// BERTScore: greedy cosine matching between per-word embeddings.
///
/// Precision averages, over response words, the best similarity to any
/// reference word; recall does the converse. Similarities are clamped to
/// [0, 1] so that precision, recall and F1 stay in range.
#[derive(Debug, Clone)]
pub struct SemanticSimilarityScorer {
    model: LazyModel<dyn EmbeddingBackend>,
    normalizer: TextNormalizer,
}

impl SemanticSimilarityScorer {
    pub fn new(model: LazyModel<dyn EmbeddingBackend>) -> Self {
        Self {
            model,
            normalizer: TextNormalizer::default(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub async fn score_texts(&self, response: &str, reference: &str) -> Result<PrecisionRecallF1> {
        let response_words = self.normalizer.words(response);
        let reference_words = self.normalizer.words(reference);
        if response_words.is_empty() || reference_words.is_empty() {
            return Err(EvalError::EmptyInput(
                "bert_score needs at least one word on each side".to_string(),
            ));
        }

        let backend = self.model.get().await?;
        let split = response_words.len();
        let mut texts = response_words;
        texts.extend(reference_words);

        let embeddings = backend.embed_batch(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(EvalError::Computation(format!(
                "embedding backend {} returned {} vectors for {} words",
                backend.model_id(),
                embeddings.len(),
                texts.len()
            )));
        }

        let (response_vectors, reference_vectors) = embeddings.split_at(split);
        Self::greedy_match(response_vectors, reference_vectors)
    }

    pub fn greedy_match(
        response: &[Vec<f32>],
        reference: &[Vec<f32>],
    ) -> Result<PrecisionRecallF1> {
        if response.is_empty() || reference.is_empty() {
            return Err(EvalError::EmptyInput("no embeddings to match".to_string()));
        }
        let dimension = response[0].len();
        if dimension == 0 || response.iter().chain(reference).any(|v| v.len() != dimension) {
            return Err(EvalError::Computation(
                "embedding dimensions are inconsistent".to_string(),
            ));
        }

        let similarities: Vec<Vec<f64>> = response
            .iter()
            .map(|r| {
                reference
                    .iter()
                    .map(|c| cosine_similarity(r, c).clamp(0.0, 1.0))
                    .collect()
            })
            .collect();

        let precision = similarities
            .iter()
            .map(|row| row.iter().cloned().fold(0.0, f64::max))
            .sum::<f64>()
            / response.len() as f64;

        let recall = (0..reference.len())
            .map(|j| similarities.iter().map(|row| row[j]).fold(0.0, f64::max))
            .sum::<f64>()
            / reference.len() as f64;

        Ok(PrecisionRecallF1::new(precision, recall))
    }
}

#[async_trait]
impl Scorer for SemanticSimilarityScorer {
    fn kind(&self) -> MetricKind {
        MetricKind::BertScore
    }

    async fn score(&self, input: &EvaluationInput) -> Result<MetricValue> {
        let scores = self.score_texts(input.response(), input.reference()).await?;
        Ok(MetricValue::PrecisionRecall(scores))
    }
}
