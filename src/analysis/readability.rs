//! Flesch readability scoring.
//!
//! Grade level and reading ease are computed from sentence, word and
//! syllable counts. Text with Devanagari characters is not scored.

use crate::models::{ReadabilityResult, ReadabilityScores};

/// Flesch-Kincaid grade level of `content`, or 0.0 when it can't be scored.
pub fn grade_level(content: &str) -> f64 {
    score_with(content, |words_per_sentence, syllables_per_word| {
        0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59
    })
}

/// Flesch reading ease of `content`, or 0.0 when it can't be scored.
pub fn reading_ease(content: &str) -> f64 {
    score_with(content, |words_per_sentence, syllables_per_word| {
        206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word
    })
}

fn score_with(content: &str, formula: impl Fn(f64, f64) -> f64) -> f64 {
    if content.is_empty() || is_not_english(content) {
        return 0.0;
    }

    let words = count_words(content);
    if words == 0 {
        return 0.0;
    }
    let sentences = count_sentences(content);
    let syllables = count_syllables(content);

    let score = formula(
        words as f64 / sentences as f64,
        syllables as f64 / words as f64,
    );
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// Number of sentences, split on `.`, `!` and `?`. Always at least 1.
pub fn count_sentences(content: &str) -> usize {
    let mut segments: Vec<&str> = content.split(['.', '!', '?']).collect();
    while segments.len() > 1 && segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }
    segments.len()
}

/// Number of alphanumeric words.
pub fn count_words(content: &str) -> usize {
    clean(content).split_whitespace().count()
}

/// Total syllables across all words.
pub fn count_syllables(content: &str) -> usize {
    clean(content)
        .to_lowercase()
        .split_whitespace()
        .map(syllables_in_word)
        .sum()
}

/// Syllables in one word: vowel groups, minus a silent trailing `e`, at least 1.
pub fn syllables_in_word(word: &str) -> usize {
    if word.is_empty() {
        return 0;
    }

    let word = word.to_lowercase();
    let mut count = 0;
    let mut last_was_vowel = false;
    for c in word.chars() {
        let vowel = is_vowel(c);
        if vowel && !last_was_vowel {
            count += 1;
        }
        last_was_vowel = vowel;
    }

    if word.ends_with('e') && count > 1 {
        count -= 1;
    }

    count.max(1)
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Whether the text contains Devanagari script.
pub fn is_not_english(content: &str) -> bool {
    content.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c))
}

fn clean(content: &str) -> String {
    content
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect()
}

/// Score every description and average the results.
pub fn analyze(descriptions: &[String]) -> ReadabilityResult {
    if descriptions.is_empty() {
        return ReadabilityResult::default();
    }

    let per_item: Vec<ReadabilityScores> = descriptions
        .iter()
        .map(|d| ReadabilityScores {
            grade_level: grade_level(d),
            reading_ease: reading_ease(d),
        })
        .collect();

    let n = per_item.len() as f64;
    let overall_grade = per_item.iter().map(|s| s.grade_level).sum::<f64>() / n;
    let overall_ease = per_item.iter().map(|s| s.reading_ease).sum::<f64>() / n;

    ReadabilityResult {
        per_item,
        overall_grade,
        overall_ease,
    }
}
