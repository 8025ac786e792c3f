//! Text analyses run over search result descriptions.
//!
//! Each analysis is a pure, synchronous function of the description list.
//! None of them fail: an empty input produces the analysis' default result.

pub mod readability;
pub mod sentiment;
pub mod word_stats;

pub use sentiment::SentimentAnalyser;

use crate::config::AnalysisConfig;
use crate::models::{AnalysisKind, AnalysisResult};
use anyhow::Result;

/// Runs one analysis by kind. Shared by every worker of every session.
pub trait Analyze: Send + Sync {
    fn run(&self, kind: AnalysisKind, descriptions: &[String]) -> AnalysisResult;
}

/// The set of analyses a session dispatches for every batch.
#[derive(Debug, Clone)]
pub struct Analyzers {
    sentiment: SentimentAnalyser,
}

impl Analyzers {
    pub fn new(sentiment: SentimentAnalyser) -> Self {
        Self { sentiment }
    }

    /// Build the analyses from configuration, loading keyword files if set.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        let happy = match config.happy_keywords_file {
            Some(ref path) => SentimentAnalyser::load_keywords(path)?,
            None => config.happy_keywords.clone(),
        };
        let sad = match config.sad_keywords_file {
            Some(ref path) => SentimentAnalyser::load_keywords(path)?,
            None => config.sad_keywords.clone(),
        };

        Ok(Self::new(SentimentAnalyser::new(happy, sad)))
    }
}

impl Analyze for Analyzers {
    fn run(&self, kind: AnalysisKind, descriptions: &[String]) -> AnalysisResult {
        match kind {
            AnalysisKind::Sentiment => AnalysisResult::Sentiment(self.sentiment.analyze(descriptions)),
            AnalysisKind::Readability => AnalysisResult::Readability(readability::analyze(descriptions)),
            AnalysisKind::WordStats => AnalysisResult::WordStats(word_stats::analyze(descriptions)),
        }
    }
}
