//! Tokenization shared by the lexical, readability and diversity metrics.

use regex::Regex;
use std::sync::OnceLock;

static TOKEN_PATTERN: OnceLock<Regex> = OnceLock::new();
static SENTENCE_BREAK: OnceLock<Regex> = OnceLock::new();

fn token_pattern() -> &'static Regex {
    TOKEN_PATTERN.get_or_init(|| {
        Regex::new(r"\w+(?:['’]\w+)*|[^\w\s]").expect("token pattern is valid")
    })
}

fn sentence_break() -> &'static Regex {
    SENTENCE_BREAK.get_or_init(|| Regex::new(r"[.!?]+(?:\s+|$)").expect("sentence pattern is valid"))
}

/// Suffix rules tried in order; the first whose remaining stem keeps at
/// least three characters wins.
const STEM_RULES: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("ization", "ize"),
    ("fulness", "ful"),
    ("iveness", "ive"),
    ("ousness", "ous"),
    ("ingly", ""),
    ("edly", ""),
    ("sses", "ss"),
    ("ies", "i"),
    ("ied", "i"),
    ("ings", ""),
    ("ing", ""),
    ("ed", ""),
    ("es", ""),
    ("ly", ""),
    ("ss", "ss"),
    ("us", "us"),
    ("is", "is"),
    ("s", ""),
    ("y", "i"),
    ("e", ""),
];

/// Deterministic tokenizer, sentence splitter and stemmer.
///
/// Empty or whitespace-only text always yields zero tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextNormalizer {
    lowercase: bool,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self { lowercase: true }
    }

    pub fn case_sensitive() -> Self {
        Self { lowercase: false }
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub fn lowercases(&self) -> bool {
        self.lowercase
    }

    fn fold(&self, token: &str) -> String {
        if self.lowercase {
            token.to_lowercase()
        } else {
            token.to_string()
        }
    }

    /// Word tokens plus stand-alone punctuation tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        token_pattern()
            .find_iter(text)
            .map(|m| self.fold(m.as_str()))
            .collect()
    }

    pub fn token_count(&self, text: &str) -> usize {
        token_pattern().find_iter(text).count()
    }

    /// Tokens carrying at least one alphanumeric character.
    pub fn words(&self, text: &str) -> Vec<String> {
        token_pattern()
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|token| token.chars().any(char::is_alphanumeric))
            .map(|token| self.fold(token))
            .collect()
    }

    /// Splits after runs of terminal punctuation. Text without any terminal
    /// punctuation is a single sentence.
    pub fn sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;

        for boundary in sentence_break().find_iter(text) {
            push_sentence(&mut sentences, &text[start..boundary.end()]);
            start = boundary.end();
        }
        push_sentence(&mut sentences, &text[start..]);

        sentences
    }

    /// Characters of the text with all whitespace removed.
    pub fn characters(&self, text: &str) -> Vec<char> {
        let folded = self.fold(text);
        folded.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// Light suffix-stripping stemmer. Conflates common inflections
    /// ("cause", "caused", "causes") without a dictionary.
    pub fn stem(&self, word: &str) -> String {
        let word = word.to_lowercase();
        if word.chars().count() <= 3 || !word.chars().all(char::is_alphabetic) {
            return word;
        }

        for (suffix, replacement) in STEM_RULES {
            if let Some(base) = word.strip_suffix(suffix) {
                if base.chars().count() < 3 {
                    continue;
                }
                let mut stem = undouble(base).to_string();
                stem.push_str(replacement);
                return stem;
            }
        }

        word
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn push_sentence(sentences: &mut Vec<String>, fragment: &str) {
    let fragment = fragment.trim();
    if fragment.chars().any(char::is_alphanumeric) {
        sentences.push(fragment.to_string());
    }
}

/// "runn" -> "run", but keeps "ll", "ss" and "zz" endings.
fn undouble(base: &str) -> &str {
    let mut chars = base.chars().rev();
    match (chars.next(), chars.next()) {
        (Some(a), Some(b)) if a == b && !"aeiouylsz".contains(a) && a.is_alphabetic() => {
            &base[..base.len() - a.len_utf8()]
        }
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_conflate_inflections() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.stem("caused"), normalizer.stem("cause"));
        assert_eq!(normalizer.stem("activities"), normalizer.stem("activity"));
        assert_eq!(normalizer.stem("running"), "run");
        assert_eq!(normalizer.stem("class"), "class");
        assert_eq!(normalizer.stem("is"), "is");
    }

    #[test]
    fn undouble_keeps_liquid_endings() {
        assert_eq!(undouble("runn"), "run");
        assert_eq!(undouble("fall"), "fall");
        assert_eq!(undouble("pass"), "pass");
    }
}
