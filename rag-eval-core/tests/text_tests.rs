use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rag_eval_core::TextNormalizer;
use rstest::rstest;

// ===== Tokenization Tests =====

#[test]
fn test_tokenize_splits_punctuation() {
    let normalizer = TextNormalizer::new();
    let tokens = normalizer.tokenize("Climate change is caused by human activities.");

    assert_eq!(
        tokens,
        vec!["climate", "change", "is", "caused", "by", "human", "activities", "."]
    );
}

#[test]
fn test_tokenize_keeps_contractions() {
    let normalizer = TextNormalizer::new();
    let tokens = normalizer.tokenize("It's the model's answer");

    assert_eq!(tokens, vec!["it's", "the", "model's", "answer"]);
}

#[test]
fn test_case_sensitive_tokenizer() {
    let normalizer = TextNormalizer::case_sensitive();
    assert_eq!(normalizer.tokenize("Hello World"), vec!["Hello", "World"]);
    assert!(!normalizer.lowercases());
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\n\t  \r\n")]
fn test_blank_text_has_no_tokens(#[case] text: &str) {
    let normalizer = TextNormalizer::new();
    assert!(normalizer.tokenize(text).is_empty());
    assert_eq!(normalizer.token_count(text), 0);
    assert!(normalizer.words(text).is_empty());
    assert!(normalizer.sentences(text).is_empty());
}

#[test]
fn test_words_drop_punctuation() {
    let normalizer = TextNormalizer::new();
    let words = normalizer.words("Wait... what?! Yes, 42 times.");

    assert_eq!(words, vec!["wait", "what", "yes", "42", "times"]);
}

// ===== Sentence Splitting Tests =====

#[test]
fn test_sentences_split_on_terminal_punctuation() {
    let normalizer = TextNormalizer::new();
    let sentences = normalizer.sentences("The sky is blue. Is it? Yes!  It is");

    assert_eq!(sentences, vec!["The sky is blue.", "Is it?", "Yes!", "It is"]);
}

#[test]
fn test_sentence_without_terminator() {
    let normalizer = TextNormalizer::new();
    assert_eq!(normalizer.sentences("no punctuation here"), vec!["no punctuation here"]);
}

#[test]
fn test_decimal_numbers_do_not_split_sentences() {
    let normalizer = TextNormalizer::new();
    assert_eq!(normalizer.sentences("Pi is 3.14 roughly."), vec!["Pi is 3.14 roughly."]);
}

#[test]
fn test_punctuation_only_fragments_dropped() {
    let normalizer = TextNormalizer::new();
    assert_eq!(normalizer.sentences("Done. ... !"), vec!["Done."]);
}

// ===== Character and Stem Tests =====

#[test]
fn test_characters_strip_whitespace() {
    let normalizer = TextNormalizer::new();
    assert_eq!(normalizer.characters("A b\tc"), vec!['a', 'b', 'c']);
}

#[rstest]
#[case("fuels", "fuel")]
#[case("burning", "burn")]
#[case("cause", "caus")]
#[case("causes", "caus")]
#[case("quickly", "quick")]
#[case("by", "by")]
#[case("2024", "2024")]
fn test_stem(#[case] word: &str, #[case] expected: &str) {
    let normalizer = TextNormalizer::new();
    assert_eq!(normalizer.stem(word), expected);
}

proptest! {
    #[test]
    fn prop_tokenize_is_deterministic(text in ".{0,80}") {
        let normalizer = TextNormalizer::new();
        prop_assert_eq!(normalizer.tokenize(&text), normalizer.tokenize(&text));
    }

    #[test]
    fn prop_token_count_matches_tokenize(text in ".{0,80}") {
        let normalizer = TextNormalizer::new();
        prop_assert_eq!(normalizer.token_count(&text), normalizer.tokenize(&text).len());
    }

    #[test]
    fn prop_non_blank_text_has_tokens(text in "\\s*[a-zA-Z0-9]+\\s*") {
        let normalizer = TextNormalizer::new();
        prop_assert!(normalizer.token_count(&text) > 0);
    }
}
