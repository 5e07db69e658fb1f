use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rag_eval_core::MetricSelection;
use rag_eval_lab::{
    batch, build_aggregator, output, telemetry, LabConfig, OutputFormat,
};
use rag_eval_metrics::ReportSummary;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "rag-eval", version, about = "Evaluate RAG responses against references")]
struct Cli {
    /// Configuration file layered over config/default and config/local
    #[arg(short, long, global = true, env = "RAG_EVAL_CONFIG")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Debug logging unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct SelectionArgs {
    /// Comma-separated metric names, e.g. bleu,rouge1,chrf
    #[arg(short, long, conflicts_with = "all")]
    metrics: Option<String>,

    /// Every metric, including the extended set
    #[arg(long)]
    all: bool,

    /// Offline embedder and lexicon classifiers for unconfigured backends
    #[arg(long)]
    offline: bool,
}

impl SelectionArgs {
    fn selection(&self, config: &LabConfig) -> Result<MetricSelection> {
        if self.all {
            return Ok(MetricSelection::All);
        }
        match &self.metrics {
            Some(list) => list.parse::<MetricSelection>().context("invalid --metrics"),
            None => Ok(config.evaluator.metrics.clone()),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate a single response
    Eval {
        #[arg(short, long)]
        question: Option<String>,

        #[arg(short, long)]
        response: String,

        #[arg(short = 'R', long)]
        reference: String,

        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Evaluate a JSON-lines file of question/response/reference objects
    Batch {
        file: PathBuf,

        /// Also print every report as a JSON line before the summary
        #[arg(long)]
        reports: bool,

        #[command(flatten)]
        selection: SelectionArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = LabConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    telemetry::init_tracing(&config.logging, cli.verbose)?;
    rag_eval_metrics::describe_metrics();

    match cli.command {
        Command::Eval {
            question,
            response,
            reference,
            selection,
        } => {
            config.backends.offline_fallback |= selection.offline;
            let metrics = selection.selection(&config)?;
            let aggregator = build_aggregator(&config)?;

            let report = aggregator
                .evaluate_with(question.as_deref(), &response, &reference, &metrics)
                .await?;
            output::write_report(cli.format, &report)?;
        }
        Command::Batch {
            file,
            reports,
            selection,
        } => {
            config.backends.offline_fallback |= selection.offline;
            let metrics = selection.selection(&config)?;
            let aggregator = build_aggregator(&config)?;

            let batch = batch::load_inputs(&file)?;
            tracing::info!(
                inputs = batch.inputs.len(),
                rejected = batch.rejected.len(),
                file = %file.display(),
                "Loaded batch"
            );

            let evaluated = aggregator.evaluate_batch(batch.inputs, &metrics).await;
            if reports {
                for report in &evaluated {
                    println!("{}", serde_json::to_string(report)?);
                }
            }

            let summary = ReportSummary::from_reports(&evaluated);
            output::write_summary(cli.format, &summary)?;
            if !batch.rejected.is_empty() {
                eprintln!("Skipped {} invalid line(s)", batch.rejected.len());
            }
        }
    }

    Ok(())
}
