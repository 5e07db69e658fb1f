use async_trait::async_trait;
use crate::domain::{EvaluationInput, MetricKind, MetricValue};
use crate::error::Result;

/// One metric over one validated input triple.
///
/// Implementations never see an input whose response or reference is empty;
/// the aggregator turns any `Err` into a failed entry of the report.
#[async_trait]
pub trait Scorer: Send + Sync {
    fn kind(&self) -> MetricKind;

    async fn score(&self, input: &EvaluationInput) -> Result<MetricValue>;
}

/// Text embedding model.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    fn model_id(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds several texts; the output order matches `texts`.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Causal language model scoring text left to right.
#[async_trait]
pub trait LanguageModelBackend: Send + Sync {
    fn model_id(&self) -> &str;

    /// Natural-log probability of each model token given its prefix.
    async fn log_likelihood(&self, text: &str) -> Result<Vec<f64>>;
}

/// Binary text classifier returning the probability of the positive label.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    fn model_id(&self) -> &str;

    async fn classify(&self, text: &str) -> Result<f64>;
}
