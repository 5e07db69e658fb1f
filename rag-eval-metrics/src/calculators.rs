pub mod bert_score;
pub mod bias;
pub mod bleu;
pub mod chrf;
pub mod diversity;
pub mod meteor;
pub mod perplexity;
pub mod readability;
pub mod rouge;
pub mod similarity;

pub use bert_score::*;
pub use bias::*;
pub use bleu::*;
pub use chrf::*;
pub use diversity::*;
pub use meteor::*;
pub use perplexity::*;
pub use readability::*;
pub use rouge::*;
pub use similarity::*;

use std::collections::HashMap;
use std::hash::Hash;

/// Count n-grams of a token sequence, keyed by borrowed windows.
pub(crate) fn ngram_counts<T: Hash + Eq>(tokens: &[T], n: usize) -> HashMap<&[T], usize> {
    let mut counts = HashMap::new();
    if n == 0 || tokens.len() < n {
        return counts;
    }
    for window in tokens.windows(n) {
        *counts.entry(window).or_insert(0) += 1;
    }
    counts
}

/// Matches between two n-gram multisets, each count clipped to the other side.
pub(crate) fn clipped_overlap<T: Hash + Eq>(
    candidate: &HashMap<&[T], usize>,
    reference: &HashMap<&[T], usize>,
) -> usize {
    candidate
        .iter()
        .map(|(ngram, count)| (*count).min(reference.get(ngram).copied().unwrap_or(0)))
        .sum()
}

/// Cosine similarity in [-1, 1]; zero when either vector has no magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a < 1e-9 || norm_b < 1e-9 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}
