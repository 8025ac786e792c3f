//! Keyword-based sentiment classification.
//!
//! A description is happy when more than 70% of its keyword hits are happy
//! keywords, sad when fewer than 30% are, and neutral otherwise (including
//! when it has no hits at all).

use crate::models::{SentimentLabel, SentimentResult};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

const HAPPY_THRESHOLD: f64 = 0.7;
const SAD_THRESHOLD: f64 = 0.3;

/// Classifies descriptions by counting happy and sad keywords.
#[derive(Debug, Clone)]
pub struct SentimentAnalyser {
    happy_keywords: Vec<String>,
    sad_keywords: Vec<String>,
}

impl SentimentAnalyser {
    /// Create an analyser from keyword lists. Keywords are matched case-insensitively.
    pub fn new(happy_keywords: Vec<String>, sad_keywords: Vec<String>) -> Self {
        Self {
            happy_keywords: normalize_keywords(happy_keywords),
            sad_keywords: normalize_keywords(sad_keywords),
        }
    }

    /// Load one keyword per line from a file.
    pub fn load_keywords(path: &Path) -> Result<Vec<String>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read keyword file: {}", path.display()))?;

        let keywords: Vec<String> = content.lines().map(String::from).collect();
        debug!("Loaded {} keywords from {}", keywords.len(), path.display());

        Ok(keywords)
    }

    /// Classify a single description.
    pub fn classify(&self, description: &str) -> SentimentLabel {
        if description.is_empty() {
            return SentimentLabel::Neutral;
        }

        let text = description.to_lowercase();
        let happy = count_all(&text, &self.happy_keywords);
        let sad = count_all(&text, &self.sad_keywords);

        label_for(happy, sad)
    }

    /// Classify a whole result set by tallying the per-description labels.
    pub fn overall(&self, labels: &[SentimentLabel]) -> SentimentLabel {
        let happy = labels.iter().filter(|l| **l == SentimentLabel::Happy).count();
        let sad = labels.iter().filter(|l| **l == SentimentLabel::Sad).count();

        label_for(happy, sad)
    }

    /// Run the analysis over every description.
    pub fn analyze(&self, descriptions: &[String]) -> SentimentResult {
        if descriptions.is_empty() {
            return SentimentResult::default();
        }

        let per_item: Vec<SentimentLabel> =
            descriptions.iter().map(|d| self.classify(d)).collect();
        let overall = self.overall(&per_item);

        SentimentResult { per_item, overall }
    }
}

fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Non-overlapping occurrences of every keyword in `text`.
fn count_all(text: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .map(|keyword| text.matches(keyword.as_str()).count())
        .sum()
}

fn label_for(happy: usize, sad: usize) -> SentimentLabel {
    let total = happy + sad;
    if total == 0 {
        return SentimentLabel::Neutral;
    }

    let happy_share = happy as f64 / total as f64;
    if happy_share > HAPPY_THRESHOLD {
        SentimentLabel::Happy
    } else if happy_share < SAD_THRESHOLD {
        SentimentLabel::Sad
    } else {
        SentimentLabel::Neutral
    }
}
