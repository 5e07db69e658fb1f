use approx::assert_relative_eq;
use proptest::prelude::*;
use rag_eval_core::TextNormalizer;
use rag_eval_metrics::{count_syllables, DiversityScorer, ReadabilityScorer, TextStatistics};
use rstest::rstest;

const CLIMATE_RESPONSE: &str = "Climate change is caused by human activities.";

// ===== Syllable Heuristic Tests =====

#[rstest]
#[case("the", 1)]
#[case("a", 1)]
#[case("table", 2)]
#[case("climate", 2)]
#[case("change", 1)]
#[case("caused", 1)]
#[case("wanted", 2)]
#[case("causes", 2)]
#[case("makes", 1)]
#[case("activities", 4)]
#[case("beautiful", 3)]
#[case("rhythm", 1)]
#[case("2023", 1)]
fn test_count_syllables(#[case] word: &str, #[case] expected: usize) {
    assert_eq!(count_syllables(word), expected);
}

// ===== Readability Tests =====

#[test]
fn test_text_statistics_climate_response() {
    let stats = TextStatistics::from_text(&TextNormalizer::new(), CLIMATE_RESPONSE).unwrap();
    assert_eq!(
        stats,
        TextStatistics {
            words: 7,
            sentences: 1,
            syllables: 12,
        }
    );
}

#[test]
fn test_flesch_kincaid_grade_climate_single_digit() {
    let grade = ReadabilityScorer::flesch_kincaid_grade()
        .calculate(CLIMATE_RESPONSE)
        .unwrap();

    assert_relative_eq!(grade, 0.39 * 7.0 + 11.8 * 12.0 / 7.0 - 15.59, epsilon = 1e-9);
    assert!(grade > 0.0 && grade < 10.0);
}

#[test]
fn test_flesch_reading_ease_climate() {
    let ease = ReadabilityScorer::flesch_reading_ease()
        .calculate(CLIMATE_RESPONSE)
        .unwrap();
    assert_relative_eq!(ease, 206.835 - 1.015 * 7.0 - 84.6 * 12.0 / 7.0, epsilon = 1e-9);
}

#[test]
fn test_statistics_formulas_match_scorers() {
    let stats = TextStatistics {
        words: 20,
        sentences: 2,
        syllables: 30,
    };

    assert_relative_eq!(stats.flesch_reading_ease(), 206.835 - 10.15 - 126.9, epsilon = 1e-9);
    assert_relative_eq!(stats.flesch_kincaid_grade(), 3.9 + 17.7 - 15.59, epsilon = 1e-9);
}

#[test]
fn test_sentence_count_drives_words_per_sentence() {
    let stats = TextStatistics::from_text(&TextNormalizer::new(), "The cat sat. The dog ran!").unwrap();
    assert_eq!(stats.sentences, 2);
    assert_relative_eq!(stats.words_per_sentence(), 3.0);
}

#[test]
fn test_text_without_terminal_punctuation_is_one_sentence() {
    let stats = TextStatistics::from_text(&TextNormalizer::new(), "no punctuation here").unwrap();
    assert_eq!(stats.sentences, 1);
}

#[test]
fn test_readability_without_words_scores_intercepts() {
    let stats = TextStatistics::from_text(&TextNormalizer::new(), "?! ...").unwrap();
    assert_eq!(stats.words, 0);
    assert_eq!(stats.syllables_per_word(), 0.0);

    let ease = ReadabilityScorer::flesch_reading_ease().calculate("?! ...").unwrap();
    let grade = ReadabilityScorer::flesch_kincaid_grade().calculate("?").unwrap();
    assert_relative_eq!(ease, 206.835);
    assert_relative_eq!(grade, -15.59);
}

#[test]
fn test_simple_text_reads_easier_than_dense_text() {
    let scorer = ReadabilityScorer::flesch_reading_ease();
    let simple = scorer.calculate("The cat sat on the mat. It was fun.").unwrap();
    let dense = scorer
        .calculate("Institutional accountability necessitates comprehensive organizational transparency.")
        .unwrap();
    assert!(simple > dense);
}

// ===== Diversity Tests =====

#[test]
fn test_diversity_climate_response_is_one() {
    assert_relative_eq!(DiversityScorer::new().diversity(CLIMATE_RESPONSE), 1.0);
}

#[test]
fn test_diversity_repetitive_text() {
    assert_relative_eq!(DiversityScorer::new().diversity("the the the the"), 1.0 / 3.0);
}

#[rstest]
#[case("")]
#[case("word")]
fn test_diversity_needs_two_tokens(#[case] text: &str) {
    assert_eq!(DiversityScorer::new().diversity(text), 0.0);
}

proptest! {
    #[test]
    fn prop_diversity_within_unit_interval(text in "[a-c]{1,3}( [a-c]{1,3}){0,20}") {
        let score = DiversityScorer::new().diversity(&text);
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn prop_syllables_at_least_one(word in "[a-z]{1,15}") {
        prop_assert!(count_syllables(&word) >= 1);
    }
}
