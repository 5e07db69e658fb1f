use async_trait::async_trait;
use rag_eval_core::{
    EvalError, EvaluationInput, MetricKind, MetricValue, Result, Scorer, TextClassifier,
};

use crate::models::LazyModel;

/// Probability that the response carries the classifier's positive label
/// (racial bias or toxicity).
#[derive(Debug, Clone)]
pub struct BiasDetector {
    kind: MetricKind,
    model: LazyModel<dyn TextClassifier>,
}

impl BiasDetector {
    pub fn racial_bias(model: LazyModel<dyn TextClassifier>) -> Self {
        Self {
            kind: MetricKind::Bias,
            model,
        }
    }

    pub fn toxicity(model: LazyModel<dyn TextClassifier>) -> Self {
        Self {
            kind: MetricKind::Toxicity,
            model,
        }
    }

    pub async fn bias_probability(&self, text: &str) -> Result<f64> {
        let classifier = self.model.get().await?;
        let probability = classifier.classify(text).await?;
        if probability.is_nan() {
            return Err(EvalError::Computation(format!(
                "classifier {} returned NaN",
                classifier.model_id()
            )));
        }
        Ok(probability.clamp(0.0, 1.0))
    }
}

#[async_trait]
impl Scorer for BiasDetector {
    fn kind(&self) -> MetricKind {
        self.kind
    }

    async fn score(&self, input: &EvaluationInput) -> Result<MetricValue> {
        Ok(MetricValue::Score(self.bias_probability(input.response()).await?))
    }
}
