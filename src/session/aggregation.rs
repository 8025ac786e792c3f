//! Bookkeeping for one in-flight search aggregation.
//!
//! Rows are enriched in place as analysis results arrive. Per-item results
//! are indexed by description, not by row, so every merge goes through the
//! description-to-row mapping captured when the batch was accepted.

use crate::models::{
    format_score, AnalysisKind, AnalysisResult, ReadabilityResult, Row, SearchBatch,
    SentimentLabel, SentimentResult, VideoRow, WordStatResult,
};
use tracing::warn;

/// Partially merged state of one batch.
#[derive(Debug, Clone)]
pub struct AggregationState {
    batch_id: u64,
    query: String,
    rows: Vec<VideoRow>,
    /// Row index of each description sent to the analyses.
    description_rows: Vec<usize>,
    /// Analyses that have not reported yet.
    pending: Vec<AnalysisKind>,
    overall_grade: f64,
    overall_ease: f64,
    overall_sentiment: SentimentLabel,
    word_stats: WordStatResult,
}

/// The finished response for one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedResponse {
    pub query: String,
    pub overall_sentiment: SentimentLabel,
    /// Overall scores first, one row per result, word statistics last.
    pub rows: Vec<Row>,
}

impl AggregationState {
    /// Start aggregating `batch`.
    ///
    /// Returns the state together with the descriptions to analyze: the
    /// non-empty descriptions in result order.
    pub fn new(batch_id: u64, batch: SearchBatch) -> (Self, Vec<String>) {
        let mut descriptions = Vec::new();
        let mut description_rows = Vec::new();

        for (index, record) in batch.results.iter().enumerate() {
            if let Some(description) = record.analyzable_description() {
                descriptions.push(description.to_string());
                description_rows.push(index);
            }
        }

        let state = Self {
            batch_id,
            query: batch.query,
            rows: batch.results.into_iter().map(VideoRow::from).collect(),
            description_rows,
            pending: AnalysisKind::ALL.to_vec(),
            overall_grade: 0.0,
            overall_ease: 0.0,
            overall_sentiment: SentimentLabel::default(),
            word_stats: WordStatResult::default(),
        };

        (state, descriptions)
    }

    pub fn batch_id(&self) -> u64 {
        self.batch_id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Number of analyses that have not reported yet.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Merge one analysis result.
    ///
    /// Returns `false` and leaves the state untouched if this analysis has
    /// already reported.
    pub fn merge(&mut self, result: AnalysisResult) -> bool {
        let kind = result.kind();
        let Some(position) = self.pending.iter().position(|k| *k == kind) else {
            warn!(
                "Ignoring duplicate {} result for '{}' (batch {})",
                kind, self.query, self.batch_id
            );
            return false;
        };
        self.pending.remove(position);

        match result {
            AnalysisResult::Sentiment(sentiment) => self.merge_sentiment(sentiment),
            AnalysisResult::Readability(readability) => self.merge_readability(readability),
            AnalysisResult::WordStats(stats) => self.word_stats = stats,
        }

        true
    }

    fn merge_sentiment(&mut self, result: SentimentResult) {
        for (label, row) in result.per_item.iter().zip(&self.description_rows) {
            if let Some(target) = self.rows.get_mut(*row) {
                target.sentiment = Some(label.to_string());
            }
        }
        self.overall_sentiment = result.overall;
    }

    fn merge_readability(&mut self, result: ReadabilityResult) {
        for (scores, row) in result.per_item.iter().zip(&self.description_rows) {
            if let Some(target) = self.rows.get_mut(*row) {
                target.grade_level = Some(format_score(scores.grade_level));
                target.reading_ease_score = Some(format_score(scores.reading_ease));
            }
        }
        self.overall_grade = result.overall_grade;
        self.overall_ease = result.overall_ease;
    }

    /// Assemble the response. The state is consumed and cannot be reused.
    pub fn finish(self) -> MergedResponse {
        let mut rows = Vec::with_capacity(self.rows.len() + 2);

        rows.push(Row::OverallScores {
            overall_grade_level: format_score(self.overall_grade),
            overall_ease_score: format_score(self.overall_ease),
        });
        rows.extend(self.rows.into_iter().map(Row::Video));
        rows.push(Row::WordStats {
            word_stats: self.word_stats.to_string(),
        });

        MergedResponse {
            query: self.query,
            overall_sentiment: self.overall_sentiment,
            rows,
        }
    }
}
