use async_trait::async_trait;
use rag_eval_core::{
    EvaluationInput, MetricKind, MetricValue, Result, Scorer, TextNormalizer,
};
use serde::{Deserialize, Serialize};

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Vowel-group syllable estimate, never below one.
///
/// A trailing silent "e" is dropped unless it closes a consonant + "le"
/// ending ("table"). "-ed" and "-es" only count as their own syllable after
/// t/d and sibilants respectively ("wanted", "causes").
pub fn count_syllables(word: &str) -> usize {
    let chars: Vec<char> = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect();
    if chars.is_empty() {
        return 1;
    }

    let mut groups = 0usize;
    let mut previous_vowel = false;
    for &c in &chars {
        let vowel = is_vowel(c);
        if vowel && !previous_vowel {
            groups += 1;
        }
        previous_vowel = vowel;
    }

    let n = chars.len();
    let consonant_at = |i: usize| !is_vowel(chars[i]);

    if groups > 1 && n >= 3 {
        let last = chars[n - 1];
        let penultimate = chars[n - 2];

        if last == 'e' && consonant_at(n - 2) {
            let le_ending = penultimate == 'l' && consonant_at(n - 3);
            if !le_ending {
                groups -= 1;
            }
        } else if penultimate == 'e' && (last == 'd' || last == 's') && consonant_at(n - 3) {
            let before = chars[n - 3];
            let voiced = match last {
                'd' => matches!(before, 't' | 'd'),
                _ => matches!(before, 's' | 'x' | 'z' | 'c' | 'g'),
            };
            if !voiced {
                groups -= 1;
            }
        }
    }

    groups.max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStatistics {
    pub words: usize,
    pub sentences: usize,
    pub syllables: usize,
}

impl TextStatistics {
    /// Text without word tokens (e.g. only punctuation) yields zero words
    /// and one sentence, so both ratios are zero.
    pub fn from_text(normalizer: &TextNormalizer, text: &str) -> Result<Self> {
        let words = normalizer.words(text);

        Ok(Self {
            words: words.len(),
            sentences: normalizer.sentences(text).len().max(1),
            syllables: words.iter().map(|w| count_syllables(w)).sum(),
        })
    }

    pub fn words_per_sentence(&self) -> f64 {
        if self.sentences == 0 {
            return 0.0;
        }
        self.words as f64 / self.sentences as f64
    }

    pub fn syllables_per_word(&self) -> f64 {
        if self.words == 0 {
            return 0.0;
        }
        self.syllables as f64 / self.words as f64
    }

    pub fn flesch_reading_ease(&self) -> f64 {
        206.835 - 1.015 * self.words_per_sentence() - 84.6 * self.syllables_per_word()
    }

    pub fn flesch_kincaid_grade(&self) -> f64 {
        0.39 * self.words_per_sentence() + 11.8 * self.syllables_per_word() - 15.59
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadabilityFormula {
    FleschReadingEase,
    FleschKincaidGrade,
}

impl ReadabilityFormula {
    pub fn apply(&self, stats: &TextStatistics) -> f64 {
        match self {
            ReadabilityFormula::FleschReadingEase => stats.flesch_reading_ease(),
            ReadabilityFormula::FleschKincaidGrade => stats.flesch_kincaid_grade(),
        }
    }
}

/// Flesch readability of the response alone. Very short or odd text can
/// land outside the nominal ranges; a response without words scores the
/// formula intercepts (206.835 and -15.59).
#[derive(Debug, Clone)]
pub struct ReadabilityScorer {
    formula: ReadabilityFormula,
    normalizer: TextNormalizer,
}

impl ReadabilityScorer {
    pub fn flesch_reading_ease() -> Self {
        Self {
            formula: ReadabilityFormula::FleschReadingEase,
            normalizer: TextNormalizer::default(),
        }
    }

    pub fn flesch_kincaid_grade() -> Self {
        Self {
            formula: ReadabilityFormula::FleschKincaidGrade,
            normalizer: TextNormalizer::default(),
        }
    }

    pub fn formula(&self) -> ReadabilityFormula {
        self.formula
    }

    pub fn calculate(&self, text: &str) -> Result<f64> {
        let stats = TextStatistics::from_text(&self.normalizer, text)?;
        Ok(self.formula.apply(&stats))
    }
}

#[async_trait]
impl Scorer for ReadabilityScorer {
    fn kind(&self) -> MetricKind {
        match self.formula {
            ReadabilityFormula::FleschReadingEase => MetricKind::FleschReadingEase,
            ReadabilityFormula::FleschKincaidGrade => MetricKind::FleschKincaidGrade,
        }
    }

    async fn score(&self, input: &EvaluationInput) -> Result<MetricValue> {
        Ok(MetricValue::Score(self.calculate(input.response())?))
    }
}
