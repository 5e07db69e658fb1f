//! Output formatting for the CLI

use anyhow::Result;
use clap::ValueEnum;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use rag_eval_core::{EvaluationReport, MetricResult, MetricStatus, MetricValue};
use rag_eval_metrics::ReportSummary;

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
        }
    }
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    table
}

fn status_cell(status: MetricStatus) -> Cell {
    match status {
        MetricStatus::Ok => Cell::new("ok").fg(Color::Green),
        MetricStatus::Failed => Cell::new("failed").fg(Color::Red),
        MetricStatus::Skipped => Cell::new("skipped").fg(Color::Yellow),
    }
}

fn format_value(result: &MetricResult) -> String {
    match &result.value {
        Some(MetricValue::Score(score)) => format!("{:.4}", score),
        Some(MetricValue::PrecisionRecall(prf)) => format!(
            "P {:.4}  R {:.4}  F1 {:.4}",
            prf.precision, prf.recall, prf.f1
        ),
        Some(MetricValue::Threshold(judgement)) => format!(
            "{:.4} ({} {:.2})",
            judgement.similarity,
            if judgement.passed { ">=" } else { "<" },
            judgement.threshold
        ),
        None => result.error.clone().unwrap_or_default(),
    }
}

pub fn render_report_table(report: &EvaluationReport) -> String {
    let mut table = new_table(&["Metric", "Status", "Value"]);
    for result in report.iter() {
        table.add_row(vec![
            Cell::new(&result.name),
            status_cell(result.status),
            Cell::new(format_value(result)),
        ]);
    }
    table.to_string()
}

pub fn render_summary_table(summary: &ReportSummary) -> String {
    let mut table = new_table(&[
        "Metric", "Count", "Failed", "Skipped", "Mean", "Median", "Std", "Min", "Max", "P90",
        "95% CI",
    ]);
    for (name, metric) in &summary.metrics {
        let interval = metric
            .confidence_interval
            .map(|(lower, upper)| format!("[{:.4}, {:.4}]", lower, upper))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(name),
            Cell::new(metric.count),
            Cell::new(metric.failures),
            Cell::new(metric.skipped),
            Cell::new(format!("{:.4}", metric.mean)),
            Cell::new(format!("{:.4}", metric.median)),
            Cell::new(format!("{:.4}", metric.std_dev)),
            Cell::new(format!("{:.4}", metric.min)),
            Cell::new(format!("{:.4}", metric.max)),
            Cell::new(format!("{:.4}", metric.p90)),
            Cell::new(interval),
        ]);
    }
    table.to_string()
}

pub fn write_report(format: OutputFormat, report: &EvaluationReport) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_report_table(report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

pub fn write_summary(format: OutputFormat, summary: &ReportSummary) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", render_summary_table(summary));
            println!("\nReports: {}", summary.reports);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
    }
    Ok(())
}
