use rag_eval_core::*;
use validator::Validate;

#[test]
fn test_evaluator_config_default() {
    let config = EvaluatorConfig::default();

    assert_eq!(config.bleu.max_n, 4);
    assert_eq!(config.bleu.smoothing, SmoothingMethod::Exponential);
    assert_eq!(config.meteor.alpha, 0.9);
    assert_eq!(config.meteor.beta, 3.0);
    assert_eq!(config.meteor.gamma, 0.5);
    assert_eq!(config.chrf.max_char_n, 6);
    assert_eq!(config.chrf.beta, 3.0);
    assert_eq!(config.similarity.factual_consistency, 0.8);
    assert_eq!(config.similarity.relevance, 0.7);
    assert!(config.lowercase);
    assert_eq!(config.execution, ExecutionMode::Concurrent);
    assert_eq!(config.metrics, MetricSelection::Default);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_config_fills_defaults() {
    let config: EvaluatorConfig = serde_json::from_str(
        r#"{"bleu": {"smoothing": "none"}, "execution": "sequential", "metrics": "all"}"#,
    )
    .unwrap();

    assert_eq!(config.bleu.max_n, 4);
    assert_eq!(config.bleu.smoothing, SmoothingMethod::None);
    assert_eq!(config.execution, ExecutionMode::Sequential);
    assert_eq!(config.metrics, MetricSelection::All);
    assert_eq!(config.chrf.max_char_n, 6);
}

#[test]
fn test_metric_subset_config() {
    let config: EvaluatorConfig =
        serde_json::from_str(r#"{"metrics": {"only": ["bleu", "chrf"]}}"#).unwrap();

    assert_eq!(
        config.metrics,
        MetricSelection::Only(vec![MetricKind::Bleu, MetricKind::Chrf])
    );
}

#[test]
fn test_invalid_bleu_order_rejected() {
    let mut config = EvaluatorConfig::default();
    config.bleu.max_n = 0;

    let err = config.validated().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_invalid_threshold_rejected() {
    let mut config = EvaluatorConfig::default();
    config.similarity.relevance = 1.5;
    assert!(config.validate().is_err());
}

#[test]
fn test_chrf_beta_must_be_positive() {
    let mut config = EvaluatorConfig::default();
    config.chrf.beta = 0.0;
    assert!(config.validate().is_err());
}
