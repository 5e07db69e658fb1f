use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorKind, EvalError};

/// Metric identities in report declaration order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Bleu,
    Rouge1,
    BertScore,
    Perplexity,
    Diversity,
    Bias,
    Meteor,
    Chrf,
    FleschReadingEase,
    FleschKincaidGrade,
    Rouge2,
    RougeL,
    SemanticSimilarity,
    FactualConsistency,
    QuestionRelevance,
    ContextRelevance,
    AnswerRelevance,
    Toxicity,
}

impl MetricKind {
    /// The metrics `evaluate_all` reports.
    pub const DEFAULT: [MetricKind; 10] = [
        MetricKind::Bleu,
        MetricKind::Rouge1,
        MetricKind::BertScore,
        MetricKind::Perplexity,
        MetricKind::Diversity,
        MetricKind::Bias,
        MetricKind::Meteor,
        MetricKind::Chrf,
        MetricKind::FleschReadingEase,
        MetricKind::FleschKincaidGrade,
    ];

    pub const ALL: [MetricKind; 18] = [
        MetricKind::Bleu,
        MetricKind::Rouge1,
        MetricKind::BertScore,
        MetricKind::Perplexity,
        MetricKind::Diversity,
        MetricKind::Bias,
        MetricKind::Meteor,
        MetricKind::Chrf,
        MetricKind::FleschReadingEase,
        MetricKind::FleschKincaidGrade,
        MetricKind::Rouge2,
        MetricKind::RougeL,
        MetricKind::SemanticSimilarity,
        MetricKind::FactualConsistency,
        MetricKind::QuestionRelevance,
        MetricKind::ContextRelevance,
        MetricKind::AnswerRelevance,
        MetricKind::Toxicity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::Bleu => "bleu",
            MetricKind::Rouge1 => "rouge1",
            MetricKind::BertScore => "bert_score",
            MetricKind::Perplexity => "perplexity",
            MetricKind::Diversity => "diversity",
            MetricKind::Bias => "bias",
            MetricKind::Meteor => "meteor",
            MetricKind::Chrf => "chrf",
            MetricKind::FleschReadingEase => "flesch_reading_ease",
            MetricKind::FleschKincaidGrade => "flesch_kincaid_grade",
            MetricKind::Rouge2 => "rouge2",
            MetricKind::RougeL => "rouge_l",
            MetricKind::SemanticSimilarity => "semantic_similarity",
            MetricKind::FactualConsistency => "factual_consistency",
            MetricKind::QuestionRelevance => "question_relevance",
            MetricKind::ContextRelevance => "context_relevance",
            MetricKind::AnswerRelevance => "answer_relevance",
            MetricKind::Toxicity => "toxicity",
        }
    }

    /// Whether the metric is computed by an external model backend.
    pub fn requires_model(&self) -> bool {
        matches!(
            self,
            MetricKind::BertScore
                | MetricKind::Perplexity
                | MetricKind::Bias
                | MetricKind::SemanticSimilarity
                | MetricKind::FactualConsistency
                | MetricKind::QuestionRelevance
                | MetricKind::ContextRelevance
                | MetricKind::AnswerRelevance
                | MetricKind::Toxicity
        )
    }

    pub fn requires_question(&self) -> bool {
        matches!(self, MetricKind::QuestionRelevance | MetricKind::AnswerRelevance)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricKind {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        MetricKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| EvalError::Validation(format!("unknown metric: {}", s)))
    }
}

/// Which metrics one evaluation should produce.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetricSelection {
    #[default]
    Default,
    All,
    Only(Vec<MetricKind>),
}

impl MetricSelection {
    /// Selected kinds in declaration order, without duplicates.
    pub fn kinds(&self) -> Vec<MetricKind> {
        match self {
            MetricSelection::Default => MetricKind::DEFAULT.to_vec(),
            MetricSelection::All => MetricKind::ALL.to_vec(),
            MetricSelection::Only(kinds) => {
                let mut kinds = kinds.clone();
                kinds.sort();
                kinds.dedup();
                kinds
            }
        }
    }

    pub fn contains(&self, kind: MetricKind) -> bool {
        match self {
            MetricSelection::Default => MetricKind::DEFAULT.contains(&kind),
            MetricSelection::All => true,
            MetricSelection::Only(kinds) => kinds.contains(&kind),
        }
    }
}

impl FromStr for MetricSelection {
    type Err = EvalError;

    /// Accepts `default`, `all`, or a comma-separated list of metric names.
    /// A list that names no metric at all is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" | "" => Ok(MetricSelection::Default),
            "all" => Ok(MetricSelection::All),
            list => {
                let kinds = list
                    .split(',')
                    .filter(|name| !name.trim().is_empty())
                    .map(MetricKind::from_str)
                    .collect::<Result<Vec<_>, _>>()?;
                if kinds.is_empty() {
                    return Err(EvalError::Validation(format!(
                        "metric list names no metric: {:?}",
                        s
                    )));
                }
                Ok(MetricSelection::Only(kinds))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PrecisionRecallF1 {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl PrecisionRecallF1 {
    /// Derives F1 as the harmonic mean; zero when both inputs are zero.
    pub fn new(precision: f64, recall: f64) -> Self {
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdJudgement {
    pub similarity: f64,
    pub threshold: f64,
    pub passed: bool,
}

impl ThresholdJudgement {
    pub fn new(similarity: f64, threshold: f64) -> Self {
        Self {
            similarity,
            threshold,
            passed: similarity >= threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetricValue {
    Score(f64),
    PrecisionRecall(PrecisionRecallF1),
    Threshold(ThresholdJudgement),
}

impl MetricValue {
    /// Headline number: the score itself, F1, or the similarity.
    pub fn headline(&self) -> f64 {
        match self {
            MetricValue::Score(score) => *score,
            MetricValue::PrecisionRecall(prf) => prf.f1,
            MetricValue::Threshold(judgement) => judgement.similarity,
        }
    }

    /// Named numeric fields; a plain score has a single unnamed component.
    pub fn components(&self) -> Vec<(&'static str, f64)> {
        match self {
            MetricValue::Score(score) => vec![("", *score)],
            MetricValue::PrecisionRecall(prf) => vec![
                ("precision", prf.precision),
                ("recall", prf.recall),
                ("f1", prf.f1),
            ],
            MetricValue::Threshold(judgement) => vec![("similarity", judgement.similarity)],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    Ok,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricResult {
    pub name: String,
    pub kind: MetricKind,
    pub status: MetricStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<MetricValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl MetricResult {
    pub fn ok(kind: MetricKind, value: MetricValue) -> Self {
        Self {
            name: kind.name().to_string(),
            kind,
            status: MetricStatus::Ok,
            value: Some(value),
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(kind: MetricKind, error: &EvalError) -> Self {
        Self {
            name: kind.name().to_string(),
            kind,
            status: MetricStatus::Failed,
            value: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }

    pub fn skipped(kind: MetricKind, reason: impl Into<String>) -> Self {
        Self {
            name: kind.name().to_string(),
            kind,
            status: MetricStatus::Skipped,
            value: None,
            error: Some(reason.into()),
            error_kind: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == MetricStatus::Ok
    }

    pub fn score(&self) -> Option<f64> {
        self.value.as_ref().map(MetricValue::headline)
    }
}
