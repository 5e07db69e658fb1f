use approx::assert_relative_eq;
use rag_eval_core::{EvaluationInput, MetricKind, MetricSelection};
use rag_eval_metrics::{MetricAggregator, MetricSummary, ModelCache, ReportSummary};
use std::sync::Arc;

// ===== MetricSummary Tests =====

#[test]
fn test_summary_basic_statistics() {
    let summary = MetricSummary::from_values(&[1.0, 2.0, 3.0, 4.0]);

    assert_eq!(summary.count, 4);
    assert_relative_eq!(summary.mean, 2.5);
    assert_relative_eq!(summary.median, 2.5);
    assert_relative_eq!(summary.min, 1.0);
    assert_relative_eq!(summary.max, 4.0);
    assert_relative_eq!(summary.p90, 3.7, epsilon = 1e-12);
    assert_relative_eq!(summary.std_dev, (5.0f64 / 3.0).sqrt(), epsilon = 1e-12);
}

#[test]
fn test_summary_confidence_interval_contains_mean() {
    let summary = MetricSummary::from_values(&[0.2, 0.4, 0.5, 0.7, 0.9]);
    let (lower, upper) = summary.confidence_interval.unwrap();

    assert!(lower < summary.mean && summary.mean < upper);
    assert_relative_eq!(summary.mean - lower, upper - summary.mean, epsilon = 1e-12);
}

#[test]
fn test_summary_single_value_has_no_interval() {
    let summary = MetricSummary::from_values(&[0.42]);
    assert_eq!(summary.count, 1);
    assert_eq!(summary.std_dev, 0.0);
    assert!(summary.confidence_interval.is_none());
}

#[test]
fn test_summary_ignores_non_finite_values() {
    let summary = MetricSummary::from_values(&[f64::NAN, 1.0, f64::INFINITY]);
    assert_eq!(summary.count, 1);
    assert_relative_eq!(summary.mean, 1.0);
}

#[test]
fn test_summary_of_nothing() {
    let summary = MetricSummary::from_values(&[]);
    assert_eq!(summary.count, 0);
    assert!(summary.confidence_interval.is_none());
}

#[test]
fn test_percentile_interpolates() {
    let sorted = [10.0, 20.0, 30.0];
    assert_relative_eq!(MetricSummary::percentile(&sorted, 0.0), 10.0);
    assert_relative_eq!(MetricSummary::percentile(&sorted, 75.0), 25.0);
    assert_relative_eq!(MetricSummary::percentile(&sorted, 100.0), 30.0);
}

// ===== ReportSummary Tests =====

#[tokio::test]
async fn test_report_summary_counts_outcomes() {
    let aggregator = MetricAggregator::builder()
        .model_cache(Arc::new(ModelCache::new()))
        .build()
        .unwrap();
    let selection = MetricSelection::Only(vec![MetricKind::Diversity, MetricKind::BertScore]);

    let inputs = vec![
        EvaluationInput::new(None, "a b c d", "reference").unwrap(),
        EvaluationInput::new(None, "a a a a", "reference").unwrap(),
    ];
    let reports = aggregator.evaluate_batch(inputs, &selection).await;
    let summary = ReportSummary::from_reports(&reports);

    assert_eq!(summary.reports, 2);
    let names: Vec<&str> = summary.metrics.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["bert_score", "diversity"]);

    let diversity = summary.get("diversity").unwrap();
    assert_eq!(diversity.count, 2);
    assert_relative_eq!(diversity.max, 1.0);
    assert_relative_eq!(diversity.min, 1.0 / 3.0);

    let bert = summary.get("bert_score").unwrap();
    assert_eq!(bert.count, 0);
    assert_eq!(bert.failures, 2);
}
