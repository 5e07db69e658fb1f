use pretty_assertions::assert_eq;
use rag_eval_core::{
    EvalError, EvaluationInput, EvaluationReport, MetricKind, MetricResult, MetricValue,
    PrecisionRecallF1, ThresholdJudgement,
};
use rag_eval_lab::{
    load_inputs, parse_inputs, render_report_table, render_summary_table, OutputFormat,
};
use rag_eval_metrics::ReportSummary;
use std::io::{Cursor, Write};

fn sample_report() -> EvaluationReport {
    let input = EvaluationInput::new(
        Some("What causes climate change?".to_string()),
        "Greenhouse gases cause warming.",
        "Climate change is caused by greenhouse gases.",
    )
    .unwrap();

    EvaluationReport::assemble(
        input,
        vec![
            MetricResult::ok(MetricKind::Bleu, MetricValue::Score(11.3521)),
            MetricResult::ok(
                MetricKind::BertScore,
                MetricValue::PrecisionRecall(PrecisionRecallF1::new(0.9, 0.8)),
            ),
            MetricResult::ok(
                MetricKind::FactualConsistency,
                MetricValue::Threshold(ThresholdJudgement::new(0.85, 0.8)),
            ),
            MetricResult::failed(
                MetricKind::Perplexity,
                &EvalError::model_unavailable("language_model:unconfigured", "no backend configured"),
            ),
        ],
    )
}

// ===== Batch Input =====

#[test]
fn test_parse_inputs_skips_blank_and_invalid_lines() {
    let jsonl = concat!(
        r#"{"question": "q?", "response": "an answer", "reference": "the answer"}"#,
        "\n",
        "\n",
        r#"{"response": "   ", "reference": "the answer"}"#,
        "\n",
        "not json\n",
        r#"{"response": "second", "reference": "second reference"}"#,
        "\n",
    );

    let batch = parse_inputs(Cursor::new(jsonl)).unwrap();

    assert_eq!(batch.inputs.len(), 2);
    assert_eq!(batch.inputs[0].question(), Some("q?"));
    assert_eq!(batch.inputs[1].question(), None);

    let lines: Vec<usize> = batch.rejected.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![3, 4]);
    assert!(batch.rejected[0].reason.contains("no tokens"));
}

#[test]
fn test_load_inputs_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{"response": "the cat sat", "reference": "the cat sat on the mat"}}"#
    )
    .unwrap();

    let batch = load_inputs(file.path()).unwrap();

    assert_eq!(batch.inputs.len(), 1);
    assert!(batch.rejected.is_empty());
    assert_eq!(batch.inputs[0].reference(), "the cat sat on the mat");
}

#[test]
fn test_load_inputs_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_inputs(&dir.path().join("missing.jsonl")).unwrap_err();

    assert!(err.to_string().contains("failed to open"));
}

// ===== Output =====

#[test]
fn test_output_format_display() {
    assert_eq!(OutputFormat::default(), OutputFormat::Table);
    assert_eq!(OutputFormat::Table.to_string(), "table");
    assert_eq!(OutputFormat::Json.to_string(), "json");
}

#[test]
fn test_report_table_lists_metrics_in_order() {
    let table = render_report_table(&sample_report());

    let bleu = table.find("bleu").unwrap();
    let bert = table.find("bert_score").unwrap();
    let perplexity = table.find("perplexity").unwrap();
    let factual = table.find("factual_consistency").unwrap();
    assert!(bleu < bert && bert < perplexity && perplexity < factual);

    assert!(table.contains("11.3521"));
    assert!(table.contains("P 0.9000  R 0.8000"));
    assert!(table.contains("0.8500 (>= 0.80)"));
    assert!(table.contains("failed"));
    assert!(table.contains("no backend configured"));
}

#[test]
fn test_summary_table_renders_statistics() {
    let reports = vec![sample_report(), sample_report()];
    let summary = ReportSummary::from_reports(&reports);

    let table = render_summary_table(&summary);

    assert!(table.contains("bleu"));
    assert!(table.contains("95% CI"));
    assert!(table.contains("11.3521"));
    assert_eq!(summary.reports, 2);
}

#[test]
fn test_report_json_is_full_report() {
    let report = sample_report();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["metrics"]["bleu"]["status"], "ok");
    assert_eq!(json["metrics"]["perplexity"]["error_kind"], "model_unavailable");
    assert_eq!(json["input"]["question"], "What causes climate change?");
}
