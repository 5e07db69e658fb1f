//! Runs every requested scorer over one input and assembles the report.

use futures::future::{join_all, FutureExt};
use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use rag_eval_core::{
    EmbeddingBackend, EvalError, EvaluationInput, EvaluationReport, EvaluatorConfig,
    ExecutionMode, LanguageModelBackend, MetricKind, MetricResult, MetricSelection, MetricStatus,
    Result, Scorer, TextClassifier, TextNormalizer,
};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use crate::calculators::{
    BiasDetector, BleuCalculator, ChrfCalculator, DiversityScorer, EmbeddingSimilarityScorer,
    FluencyScorer, MeteorCalculator, ReadabilityScorer, RougeCalculator,
    SemanticSimilarityScorer,
};
use crate::models::{LazyModel, ModelCache, ModelKey};
use crate::offline::{HashingEmbedder, LexiconClassifier};

const DEFAULT_BATCH_CONCURRENCY: usize = 4;

/// Registers descriptions for the metrics emitted by the aggregator.
pub fn describe_metrics() {
    describe_counter!(
        "rag_eval_metric_total",
        Unit::Count,
        "Metric computations by metric and outcome"
    );
    describe_histogram!(
        "rag_eval_metric_duration_seconds",
        Unit::Seconds,
        "Time spent computing one metric"
    );
    describe_counter!(
        "rag_eval_reports_total",
        Unit::Count,
        "Evaluation reports produced"
    );
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn status_label(status: MetricStatus) -> &'static str {
    match status {
        MetricStatus::Ok => "ok",
        MetricStatus::Failed => "failed",
        MetricStatus::Skipped => "skipped",
    }
}

/// Evaluates response/reference pairs against a fixed set of scorers.
///
/// A failing or panicking scorer becomes a `Failed` entry of the report; only
/// an empty response or reference fails the whole call.
pub struct MetricAggregator {
    scorers: BTreeMap<MetricKind, Arc<dyn Scorer>>,
    execution: ExecutionMode,
    default_selection: MetricSelection,
    batch_concurrency: usize,
}

impl MetricAggregator {
    pub fn builder() -> MetricAggregatorBuilder {
        MetricAggregatorBuilder::default()
    }

    /// Kinds with a registered scorer, in declaration order.
    pub fn scorer_kinds(&self) -> Vec<MetricKind> {
        self.scorers.keys().copied().collect()
    }

    pub fn execution(&self) -> ExecutionMode {
        self.execution
    }

    /// Evaluates the configured default selection.
    pub async fn evaluate_all(
        &self,
        question: Option<&str>,
        response: &str,
        reference: &str,
    ) -> Result<EvaluationReport> {
        self.evaluate_with(question, response, reference, &self.default_selection)
            .await
    }

    pub async fn evaluate_with(
        &self,
        question: Option<&str>,
        response: &str,
        reference: &str,
        selection: &MetricSelection,
    ) -> Result<EvaluationReport> {
        let input = EvaluationInput::new(question.map(str::to_string), response, reference)?;
        Ok(self.evaluate(input, selection).await)
    }

    pub async fn evaluate(
        &self,
        input: EvaluationInput,
        selection: &MetricSelection,
    ) -> EvaluationReport {
        let started = Instant::now();
        let kinds = selection.kinds();

        let results = match self.execution {
            ExecutionMode::Concurrent => {
                join_all(kinds.iter().map(|kind| self.run_metric(*kind, &input))).await
            }
            ExecutionMode::Sequential => {
                let mut results = Vec::with_capacity(kinds.len());
                for kind in &kinds {
                    results.push(self.run_metric(*kind, &input).await);
                }
                results
            }
        };

        let report = EvaluationReport::assemble(input, results);
        counter!("rag_eval_reports_total").increment(1);
        tracing::info!(
            report_id = %report.id(),
            metrics = report.len(),
            failures = report.failures().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Evaluation complete"
        );
        report
    }

    /// Reports come back in input order.
    pub async fn evaluate_batch(
        &self,
        inputs: Vec<EvaluationInput>,
        selection: &MetricSelection,
    ) -> Vec<EvaluationReport> {
        stream::iter(inputs)
            .map(|input| self.evaluate(input, selection))
            .buffered(self.batch_concurrency)
            .collect()
            .await
    }

    async fn run_metric(&self, kind: MetricKind, input: &EvaluationInput) -> MetricResult {
        let Some(scorer) = self.scorers.get(&kind) else {
            return self.record(kind, MetricResult::skipped(kind, "no scorer registered"), None);
        };
        if kind.requires_question() && input.question().is_none() {
            return self.record(kind, MetricResult::skipped(kind, "no question supplied"), None);
        }

        let started = Instant::now();
        let outcome = AssertUnwindSafe(scorer.score(input)).catch_unwind().await;

        let result = match outcome {
            Ok(Ok(value)) if value.components().iter().all(|(_, v)| v.is_finite()) => {
                MetricResult::ok(kind, value)
            }
            Ok(Ok(_)) => self.failure(
                kind,
                EvalError::Computation("scorer produced a non-finite value".to_string()),
            ),
            Ok(Err(e)) => self.failure(kind, e),
            Err(payload) => self.failure(
                kind,
                EvalError::Computation(format!("scorer panicked: {}", panic_message(&*payload))),
            ),
        };

        self.record(kind, result, Some(started))
    }

    fn failure(&self, kind: MetricKind, error: EvalError) -> MetricResult {
        tracing::warn!(
            metric = kind.name(),
            error_kind = %error.kind(),
            error = %error,
            "Metric failed"
        );
        MetricResult::failed(kind, &error)
    }

    fn record(&self, kind: MetricKind, result: MetricResult, started: Option<Instant>) -> MetricResult {
        counter!(
            "rag_eval_metric_total",
            "metric" => kind.name(),
            "status" => status_label(result.status)
        )
        .increment(1);
        if let Some(started) = started {
            histogram!("rag_eval_metric_duration_seconds", "metric" => kind.name())
                .record(started.elapsed().as_secs_f64());
        }
        result
    }
}

impl std::fmt::Debug for MetricAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricAggregator")
            .field("scorers", &self.scorer_kinds())
            .field("execution", &self.execution)
            .field("default_selection", &self.default_selection)
            .finish()
    }
}

/// Wires scorers to their backends. Backends left unset produce scorers that
/// fail with `ModelUnavailable`, never a build error.
#[derive(Default)]
pub struct MetricAggregatorBuilder {
    config: EvaluatorConfig,
    embedding: Option<LazyModel<dyn EmbeddingBackend>>,
    language_model: Option<LazyModel<dyn LanguageModelBackend>>,
    bias_classifier: Option<LazyModel<dyn TextClassifier>>,
    toxicity_classifier: Option<LazyModel<dyn TextClassifier>>,
    model_cache: Option<Arc<ModelCache>>,
    overrides: Vec<Arc<dyn Scorer>>,
    batch_concurrency: Option<usize>,
}

impl MetricAggregatorBuilder {
    pub fn config(mut self, config: EvaluatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn execution(mut self, execution: ExecutionMode) -> Self {
        self.config.execution = execution;
        self
    }

    pub fn embedding(mut self, model: LazyModel<dyn EmbeddingBackend>) -> Self {
        self.embedding = Some(model);
        self
    }

    pub fn language_model(mut self, model: LazyModel<dyn LanguageModelBackend>) -> Self {
        self.language_model = Some(model);
        self
    }

    pub fn bias_classifier(mut self, model: LazyModel<dyn TextClassifier>) -> Self {
        self.bias_classifier = Some(model);
        self
    }

    pub fn toxicity_classifier(mut self, model: LazyModel<dyn TextClassifier>) -> Self {
        self.toxicity_classifier = Some(model);
        self
    }

    /// Hashing embedder and lexicon classifiers for the slots not set yet.
    /// Perplexity has no offline backend.
    pub fn offline_backends(mut self) -> Self {
        if self.embedding.is_none() {
            let embedder = HashingEmbedder::default();
            let key = ModelKey::new("embedding", embedder.model_id());
            self.embedding = Some(LazyModel::ready(key, Arc::new(embedder)));
        }
        if self.bias_classifier.is_none() {
            let key = ModelKey::new("bias", "lexicon-racial-bias");
            self.bias_classifier = Some(LazyModel::ready(
                key,
                Arc::new(LexiconClassifier::racial_bias()),
            ));
        }
        if self.toxicity_classifier.is_none() {
            let key = ModelKey::new("toxicity", "lexicon-toxicity");
            self.toxicity_classifier = Some(LazyModel::ready(
                key,
                Arc::new(LexiconClassifier::toxicity()),
            ));
        }
        self
    }

    /// Resolves every backend through `cache` instead of the global one.
    pub fn model_cache(mut self, cache: Arc<ModelCache>) -> Self {
        self.model_cache = Some(cache);
        self
    }

    /// Replaces the built-in scorer for `scorer.kind()`.
    pub fn scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.overrides.push(scorer);
        self
    }

    pub fn batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = Some(concurrency.max(1));
        self
    }

    pub fn build(self) -> Result<MetricAggregator> {
        let config = self.config.validated()?;
        let normalizer = TextNormalizer::new().with_lowercase(config.lowercase);
        let cache = self.model_cache;

        let embedding: LazyModel<dyn EmbeddingBackend> =
            resolve_model(self.embedding, "embedding", &cache);
        let language_model: LazyModel<dyn LanguageModelBackend> =
            resolve_model(self.language_model, "language_model", &cache);
        let bias: LazyModel<dyn TextClassifier> =
            resolve_model(self.bias_classifier, "bias", &cache);
        let toxicity: LazyModel<dyn TextClassifier> =
            resolve_model(self.toxicity_classifier, "toxicity", &cache);

        let thresholds = &config.similarity;
        let built: Vec<Arc<dyn Scorer>> = vec![
            Arc::new(BleuCalculator::from_config(&config.bleu).with_normalizer(normalizer)),
            Arc::new(RougeCalculator::rouge_1().with_normalizer(normalizer)),
            Arc::new(SemanticSimilarityScorer::new(embedding.clone()).with_normalizer(normalizer)),
            Arc::new(FluencyScorer::new(language_model)),
            Arc::new(DiversityScorer::new().with_normalizer(normalizer)),
            Arc::new(BiasDetector::racial_bias(bias)),
            Arc::new(MeteorCalculator::from_config(&config.meteor).with_normalizer(normalizer)),
            Arc::new(ChrfCalculator::from_config(&config.chrf).with_normalizer(normalizer)),
            Arc::new(ReadabilityScorer::flesch_reading_ease()),
            Arc::new(ReadabilityScorer::flesch_kincaid_grade()),
            Arc::new(RougeCalculator::rouge_2().with_normalizer(normalizer)),
            Arc::new(RougeCalculator::rouge_l().with_normalizer(normalizer)),
            Arc::new(EmbeddingSimilarityScorer::semantic_similarity(embedding.clone())),
            Arc::new(EmbeddingSimilarityScorer::factual_consistency(
                embedding.clone(),
                thresholds.factual_consistency,
            )),
            Arc::new(EmbeddingSimilarityScorer::question_relevance(
                embedding.clone(),
                thresholds.relevance,
            )),
            Arc::new(EmbeddingSimilarityScorer::context_relevance(
                embedding.clone(),
                thresholds.relevance,
            )),
            Arc::new(EmbeddingSimilarityScorer::answer_relevance(
                embedding,
                thresholds.relevance,
            )),
            Arc::new(BiasDetector::toxicity(toxicity)),
        ];

        let mut scorers: BTreeMap<MetricKind, Arc<dyn Scorer>> = BTreeMap::new();
        for scorer in built.into_iter().chain(self.overrides) {
            scorers.insert(scorer.kind(), scorer);
        }

        tracing::debug!(
            scorers = scorers.len(),
            execution = ?config.execution,
            "Metric aggregator built"
        );

        Ok(MetricAggregator {
            scorers,
            execution: config.execution,
            default_selection: config.metrics,
            batch_concurrency: self.batch_concurrency.unwrap_or(DEFAULT_BATCH_CONCURRENCY),
        })
    }
}

fn resolve_model<B: ?Sized + Send + Sync + 'static>(
    model: Option<LazyModel<B>>,
    role: &str,
    cache: &Option<Arc<ModelCache>>,
) -> LazyModel<B> {
    let model =
        model.unwrap_or_else(|| LazyModel::unconfigured(ModelKey::new(role, "unconfigured")));
    match cache {
        Some(cache) => model.with_cache(cache.clone()),
        None => model,
    }
}
