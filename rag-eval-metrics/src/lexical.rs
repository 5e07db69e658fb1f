use rag_eval_core::{EvalError, EvaluatorConfig, Result, TextNormalizer};

use crate::calculators::{BleuCalculator, ChrfCalculator, MeteorCalculator, RougeCalculator};

/// Direct access to the reference-based lexical metrics without building an
/// aggregator.
#[derive(Debug, Clone)]
pub struct LexicalMetricSet {
    bleu: BleuCalculator,
    rouge1: RougeCalculator,
    meteor: MeteorCalculator,
    chrf: ChrfCalculator,
}

impl LexicalMetricSet {
    pub fn new() -> Self {
        Self::from_config(&EvaluatorConfig::default())
    }

    pub fn from_config(config: &EvaluatorConfig) -> Self {
        let normalizer = TextNormalizer::new().with_lowercase(config.lowercase);
        Self {
            bleu: BleuCalculator::from_config(&config.bleu).with_normalizer(normalizer),
            rouge1: RougeCalculator::rouge_1().with_normalizer(normalizer),
            meteor: MeteorCalculator::from_config(&config.meteor).with_normalizer(normalizer),
            chrf: ChrfCalculator::from_config(&config.chrf).with_normalizer(normalizer),
        }
    }

    fn check(response: &str, reference: &str) -> Result<()> {
        if response.trim().is_empty() {
            return Err(EvalError::EmptyInput("response is empty".to_string()));
        }
        if reference.trim().is_empty() {
            return Err(EvalError::EmptyInput("reference is empty".to_string()));
        }
        Ok(())
    }

    /// BLEU on the reported 0-100 scale.
    pub fn bleu(&self, response: &str, reference: &str) -> Result<f64> {
        Self::check(response, reference)?;
        let (bleu, _) = self.bleu.calculate_bleu(response, reference);
        Ok(bleu * 100.0)
    }

    /// ROUGE-1 F1.
    pub fn rouge1(&self, response: &str, reference: &str) -> Result<f64> {
        Self::check(response, reference)?;
        Ok(self.rouge1.calculate(response, reference).f1)
    }

    pub fn meteor(&self, response: &str, reference: &str) -> Result<f64> {
        Self::check(response, reference)?;
        Ok(self.meteor.calculate_meteor(response, reference))
    }

    pub fn chrf(&self, response: &str, reference: &str) -> Result<f64> {
        Self::check(response, reference)?;
        Ok(self.chrf.calculate_chrf(response, reference))
    }
}

impl Default for LexicalMetricSet {
    fn default() -> Self {
        Self::new()
    }
}
