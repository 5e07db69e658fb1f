use async_trait::async_trait;
use rag_eval_core::{
    EvaluationInput, MeteorConfig, MetricKind, MetricValue, Result, Scorer, TextNormalizer,
};
use std::collections::HashMap;

/// METEOR with exact, stem and synonym matching stages.
///
/// No synonym lexicon ships with the crate: the synonym stage only runs for
/// groups supplied through [`MeteorConfig::synonyms`], so a default
/// calculator aligns on exact words and stems alone.
#[derive(Debug, Clone)]
pub struct MeteorCalculator {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    /// word -> synonym group
    synonyms: HashMap<String, usize>,
    normalizer: TextNormalizer,
}

/// One aligned pair: (response index, reference index).
type Alignment = Vec<(usize, usize)>;

impl MeteorCalculator {
    pub fn new() -> Self {
        Self::from_config(&MeteorConfig::default())
    }

    pub fn from_config(config: &MeteorConfig) -> Self {
        let mut synonyms = HashMap::new();
        for (group, words) in config.synonyms.iter().enumerate() {
            for word in words {
                synonyms.insert(word.to_lowercase(), group);
            }
        }

        Self {
            alpha: config.alpha,
            beta: config.beta,
            gamma: config.gamma,
            synonyms,
            normalizer: TextNormalizer::default(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    fn are_synonyms(&self, a: &str, b: &str) -> bool {
        match (self.synonyms.get(&a.to_lowercase()), self.synonyms.get(&b.to_lowercase())) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Aligns still-unmatched words whose keys are equal, choosing the
    /// closest reference position for each response word.
    fn match_stage<F>(
        hyp: &[String],
        refs: &[String],
        hyp_used: &mut [bool],
        ref_used: &mut [bool],
        alignment: &mut Alignment,
        same: F,
    ) where
        F: Fn(&str, &str) -> bool,
    {
        for (i, word) in hyp.iter().enumerate() {
            if hyp_used[i] {
                continue;
            }
            let best = refs
                .iter()
                .enumerate()
                .filter(|(j, candidate)| !ref_used[*j] && same(word, candidate))
                .min_by_key(|(j, _)| (*j as isize - i as isize).unsigned_abs())
                .map(|(j, _)| j);

            if let Some(j) = best {
                hyp_used[i] = true;
                ref_used[j] = true;
                alignment.push((i, j));
            }
        }
    }

    fn align(&self, hyp: &[String], refs: &[String]) -> Alignment {
        let mut hyp_used = vec![false; hyp.len()];
        let mut ref_used = vec![false; refs.len()];
        let mut alignment = Vec::new();

        Self::match_stage(hyp, refs, &mut hyp_used, &mut ref_used, &mut alignment, |a, b| a == b);

        let hyp_stems: Vec<String> = hyp.iter().map(|w| self.normalizer.stem(w)).collect();
        let ref_stems: Vec<String> = refs.iter().map(|w| self.normalizer.stem(w)).collect();
        Self::match_stage(
            &hyp_stems,
            &ref_stems,
            &mut hyp_used,
            &mut ref_used,
            &mut alignment,
            |a, b| a == b,
        );

        if !self.synonyms.is_empty() {
            Self::match_stage(hyp, refs, &mut hyp_used, &mut ref_used, &mut alignment, |a, b| {
                self.are_synonyms(a, b)
            });
        }

        alignment.sort_unstable();
        alignment
    }

    /// Contiguous runs of the alignment that are adjacent on both sides
    fn count_chunks(alignment: &[(usize, usize)]) -> usize {
        if alignment.is_empty() {
            return 0;
        }
        1 + alignment
            .windows(2)
            .filter(|pair| !(pair[1].0 == pair[0].0 + 1 && pair[1].1 == pair[0].1 + 1))
            .count()
    }

    /// METEOR in [0, 1].
    pub fn calculate_meteor(&self, predicted: &str, reference: &str) -> f64 {
        let hyp = self.normalizer.words(predicted);
        let refs = self.normalizer.words(reference);
        if hyp.is_empty() || refs.is_empty() {
            return 0.0;
        }

        let alignment = self.align(&hyp, &refs);
        let matches = alignment.len();
        if matches == 0 {
            return 0.0;
        }

        let precision = matches as f64 / hyp.len() as f64;
        let recall = matches as f64 / refs.len() as f64;
        let denominator = self.alpha * precision + (1.0 - self.alpha) * recall;
        if denominator <= 0.0 {
            return 0.0;
        }
        let fmean = precision * recall / denominator;

        let fragmentation = Self::count_chunks(&alignment) as f64 / matches as f64;
        let penalty = self.gamma * fragmentation.powf(self.beta);

        (fmean * (1.0 - penalty)).clamp(0.0, 1.0)
    }
}

impl Default for MeteorCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scorer for MeteorCalculator {
    fn kind(&self) -> MetricKind {
        MetricKind::Meteor
    }

    async fn score(&self, input: &EvaluationInput) -> Result<MetricValue> {
        Ok(MetricValue::Score(
            self.calculate_meteor(input.response(), input.reference()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_of_contiguous_alignment() {
        assert_eq!(MeteorCalculator::count_chunks(&[(0, 0), (1, 1), (2, 2)]), 1);
        assert_eq!(MeteorCalculator::count_chunks(&[(0, 2), (1, 0), (2, 1)]), 2);
        assert_eq!(MeteorCalculator::count_chunks(&[]), 0);
    }
}
