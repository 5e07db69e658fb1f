use async_trait::async_trait;
use rag_eval_core::{
    EmbeddingBackend, EvalError, EvaluationInput, MetricKind, MetricValue, Result, Scorer,
    ThresholdJudgement,
};

use super::cosine_similarity;
use crate::models::LazyModel;

/// Which two texts of the input a similarity metric compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    ResponseReference,
    QuestionResponse,
}

/// Whole-text embedding similarity.
///
/// `semantic_similarity` reports the raw cosine in [-1, 1]. The other kinds
/// report a [`ThresholdJudgement`] against a configured threshold.
#[derive(Debug, Clone)]
pub struct EmbeddingSimilarityScorer {
    kind: MetricKind,
    comparison: Comparison,
    threshold: Option<f64>,
    model: LazyModel<dyn EmbeddingBackend>,
}

impl EmbeddingSimilarityScorer {
    pub fn semantic_similarity(model: LazyModel<dyn EmbeddingBackend>) -> Self {
        Self {
            kind: MetricKind::SemanticSimilarity,
            comparison: Comparison::ResponseReference,
            threshold: None,
            model,
        }
    }

    pub fn factual_consistency(model: LazyModel<dyn EmbeddingBackend>, threshold: f64) -> Self {
        Self {
            kind: MetricKind::FactualConsistency,
            comparison: Comparison::ResponseReference,
            threshold: Some(threshold),
            model,
        }
    }

    pub fn question_relevance(model: LazyModel<dyn EmbeddingBackend>, threshold: f64) -> Self {
        Self {
            kind: MetricKind::QuestionRelevance,
            comparison: Comparison::QuestionResponse,
            threshold: Some(threshold),
            model,
        }
    }

    /// Reference treated as retrieved context.
    pub fn context_relevance(model: LazyModel<dyn EmbeddingBackend>, threshold: f64) -> Self {
        Self {
            kind: MetricKind::ContextRelevance,
            comparison: Comparison::ResponseReference,
            threshold: Some(threshold),
            model,
        }
    }

    pub fn answer_relevance(model: LazyModel<dyn EmbeddingBackend>, threshold: f64) -> Self {
        Self {
            kind: MetricKind::AnswerRelevance,
            comparison: Comparison::QuestionResponse,
            threshold: Some(threshold),
            model,
        }
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub async fn similarity(&self, left: &str, right: &str) -> Result<f64> {
        let backend = self.model.get().await?;
        let texts = [left.to_string(), right.to_string()];
        let vectors = backend.embed_batch(&texts).await?;

        match vectors.as_slice() {
            [a, b] if !a.is_empty() && a.len() == b.len() => Ok(cosine_similarity(a, b)),
            _ => Err(EvalError::Computation(format!(
                "embedding backend {} returned unusable vectors",
                backend.model_id()
            ))),
        }
    }
}

#[async_trait]
impl Scorer for EmbeddingSimilarityScorer {
    fn kind(&self) -> MetricKind {
        self.kind
    }

    async fn score(&self, input: &EvaluationInput) -> Result<MetricValue> {
        let (left, right) = match self.comparison {
            Comparison::ResponseReference => (input.response(), input.reference()),
            Comparison::QuestionResponse => {
                let question = input.question().ok_or_else(|| {
                    EvalError::EmptyInput(format!("{} needs a question", self.kind))
                })?;
                (question, input.response())
            }
        };

        let similarity = self.similarity(left, right).await?;
        Ok(match self.threshold {
            Some(threshold) => MetricValue::Threshold(ThresholdJudgement::new(similarity, threshold)),
            None => MetricValue::Score(similarity),
        })
    }
}
