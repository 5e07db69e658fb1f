use serde::{Deserialize, Serialize};
use validator::Validate;

use super::metric::MetricSelection;
use crate::error::Result;

// ===== Lexical Metric Configuration =====

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMethod {
    None,
    Add1,
    Add01,
    /// Halves the pseudo-count for every order with zero matches.
    #[default]
    Exponential,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(default)]
pub struct BleuConfig {
    #[validate(range(min = 1, max = 8))]
    pub max_n: usize,
    pub smoothing: SmoothingMethod,
}

impl Default for BleuConfig {
    fn default() -> Self {
        Self {
            max_n: 4,
            smoothing: SmoothingMethod::Exponential,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(default)]
pub struct MeteorConfig {
    #[validate(range(min = 0.0, max = 1.0))]
    pub alpha: f64,
    #[validate(range(min = 0.0))]
    pub beta: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub gamma: f64,
    /// Groups of interchangeable words for the synonym matching stage.
    /// Empty by default, which disables that stage.
    pub synonyms: Vec<Vec<String>>,
}

impl Default for MeteorConfig {
    fn default() -> Self {
        Self {
            alpha: 0.9,
            beta: 3.0,
            gamma: 0.5,
            synonyms: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(default)]
pub struct ChrfConfig {
    #[validate(range(min = 1, max = 10))]
    pub max_char_n: usize,
    #[validate(range(exclusive_min = 0.0))]
    pub beta: f64,
}

impl Default for ChrfConfig {
    fn default() -> Self {
        Self {
            max_char_n: 6,
            beta: 3.0,
        }
    }
}

// ===== Similarity Configuration =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(default)]
pub struct SimilarityThresholds {
    #[validate(range(min = 0.0, max = 1.0))]
    pub factual_consistency: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub relevance: f64,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            factual_consistency: 0.8,
            relevance: 0.7,
        }
    }
}

// ===== Evaluator Configuration =====

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One scorer at a time; a slow backend stalls the whole report.
    Sequential,
    #[default]
    Concurrent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(default)]
pub struct EvaluatorConfig {
    #[validate(nested)]
    pub bleu: BleuConfig,
    #[validate(nested)]
    pub meteor: MeteorConfig,
    #[validate(nested)]
    pub chrf: ChrfConfig,
    #[validate(nested)]
    pub similarity: SimilarityThresholds,
    /// Case-fold text before lexical comparison.
    pub lowercase: bool,
    pub execution: ExecutionMode,
    pub metrics: MetricSelection,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            bleu: BleuConfig::default(),
            meteor: MeteorConfig::default(),
            chrf: ChrfConfig::default(),
            similarity: SimilarityThresholds::default(),
            lowercase: true,
            execution: ExecutionMode::default(),
            metrics: MetricSelection::default(),
        }
    }
}

impl EvaluatorConfig {
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }
}
