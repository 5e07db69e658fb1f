use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

use super::input::EvaluationInput;
use super::metric::{MetricKind, MetricResult, MetricStatus};

static LAST_EVALUATED_MICROS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Wall-clock timestamp that never repeats or goes backwards within the
/// process; bumped by one microsecond when the clock has not advanced.
fn next_evaluated_at() -> DateTime<Utc> {
    let now = Utc::now().timestamp_micros();
    let mut last = LAST_EVALUATED_MICROS.load(Ordering::Acquire);
    loop {
        let candidate = if now > last { now } else { last + 1 };
        match LAST_EVALUATED_MICROS.compare_exchange_weak(
            last,
            candidate,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => return DateTime::from_timestamp_micros(candidate).unwrap_or_else(Utc::now),
            Err(actual) => last = actual,
        }
    }
}

/// Read-only snapshot of one evaluation. Metrics are keyed by name in
/// declaration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationReport {
    id: Uuid,
    input: EvaluationInput,
    metrics: IndexMap<String, MetricResult>,
    evaluated_at: DateTime<Utc>,
}

impl EvaluationReport {
    /// Orders `results` by metric declaration order and stamps the report.
    pub fn assemble(input: EvaluationInput, mut results: Vec<MetricResult>) -> Self {
        results.sort_by_key(|result| result.kind);
        let metrics = results
            .into_iter()
            .map(|result| (result.name.clone(), result))
            .collect();

        Self {
            id: Uuid::new_v4(),
            input,
            metrics,
            evaluated_at: next_evaluated_at(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn input(&self) -> &EvaluationInput {
        &self.input
    }

    pub fn question(&self) -> Option<&str> {
        self.input.question()
    }

    pub fn response(&self) -> &str {
        self.input.response()
    }

    pub fn reference(&self) -> &str {
        self.input.reference()
    }

    pub fn evaluated_at(&self) -> DateTime<Utc> {
        self.evaluated_at
    }

    pub fn metrics(&self) -> &IndexMap<String, MetricResult> {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&MetricResult> {
        self.metrics.get(name)
    }

    pub fn result(&self, kind: MetricKind) -> Option<&MetricResult> {
        self.metrics.get(kind.name())
    }

    /// Headline score of a successful metric.
    pub fn score(&self, kind: MetricKind) -> Option<f64> {
        self.result(kind).and_then(MetricResult::score)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricResult> {
        self.metrics.values()
    }

    pub fn failures(&self) -> impl Iterator<Item = &MetricResult> {
        self.metrics
            .values()
            .filter(|result| result.status == MetricStatus::Failed)
    }

    pub fn all_ok(&self) -> bool {
        self.metrics.values().all(MetricResult::is_ok)
    }

    /// Flat name -> value mapping; failed and skipped metrics map to `null`.
    pub fn values(&self) -> IndexMap<String, serde_json::Value> {
        self.metrics
            .iter()
            .map(|(name, result)| {
                let value = result
                    .value
                    .as_ref()
                    .and_then(|value| serde_json::to_value(value).ok())
                    .unwrap_or(serde_json::Value::Null);
                (name.clone(), value)
            })
            .collect()
    }
}
