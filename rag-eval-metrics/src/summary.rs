//! Batch statistics over many evaluation reports.

use indexmap::IndexMap;
use rag_eval_core::{EvaluationReport, MetricStatus};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricSummary {
    /// Reports in which the metric produced a value.
    pub count: usize,
    pub failures: usize,
    pub skipped: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p90: f64,
    /// 95% Student-t interval for the mean; needs two or more values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_interval: Option<(f64, f64)>,
}

impl MetricSummary {
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return Self::empty();
        }
        sorted.sort_by(f64::total_cmp);

        let mean = sorted.as_slice().mean();
        let std_dev = if sorted.len() > 1 {
            sorted.as_slice().std_dev()
        } else {
            0.0
        };

        Self {
            count: sorted.len(),
            failures: 0,
            skipped: 0,
            mean,
            median: Self::percentile(&sorted, 50.0),
            std_dev,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            p90: Self::percentile(&sorted, 90.0),
            confidence_interval: Self::confidence_interval(mean, std_dev, sorted.len(), 0.95),
        }
    }

    fn empty() -> Self {
        Self {
            count: 0,
            failures: 0,
            skipped: 0,
            mean: 0.0,
            median: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
            p90: 0.0,
            confidence_interval: None,
        }
    }

    /// Linear interpolation between closest ranks of a sorted slice.
    pub fn percentile(sorted: &[f64], p: f64) -> f64 {
        if sorted.is_empty() {
            return 0.0;
        }
        if sorted.len() == 1 {
            return sorted[0];
        }

        let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = rank.ceil() as usize;
        let weight = rank - lower as f64;

        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }

    fn confidence_interval(mean: f64, std_dev: f64, n: usize, confidence: f64) -> Option<(f64, f64)> {
        if n < 2 {
            return None;
        }
        let t_dist = StudentsT::new(0.0, 1.0, (n - 1) as f64).ok()?;
        let t_value = t_dist.inverse_cdf((1.0 + confidence) / 2.0);
        let margin = t_value * std_dev / (n as f64).sqrt();
        Some((mean - margin, mean + margin))
    }
}

/// Per-metric statistics of a batch, keyed by metric name in report order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    pub reports: usize,
    pub metrics: IndexMap<String, MetricSummary>,
}

impl ReportSummary {
    pub fn from_reports(reports: &[EvaluationReport]) -> Self {
        let mut values: IndexMap<String, (Vec<f64>, usize, usize)> = IndexMap::new();

        for report in reports {
            for result in report.iter() {
                let entry = values.entry(result.name.clone()).or_default();
                match result.status {
                    MetricStatus::Ok => entry.0.extend(result.score()),
                    MetricStatus::Failed => entry.1 += 1,
                    MetricStatus::Skipped => entry.2 += 1,
                }
            }
        }

        let metrics = values
            .into_iter()
            .map(|(name, (scores, failures, skipped))| {
                let mut summary = MetricSummary::from_values(&scores);
                summary.failures = failures;
                summary.skipped = skipped;
                (name, summary)
            })
            .collect();

        Self {
            reports: reports.len(),
            metrics,
        }
    }

    pub fn get(&self, name: &str) -> Option<&MetricSummary> {
        self.metrics.get(name)
    }
}
