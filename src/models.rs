//! Data models for the search analytics service.
//!
//! This module contains the core data structures shared by the provider,
//! the analyses and the session coordinator: search records, typed analysis
//! results, and the rows that make up the merged wire payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single video returned by the search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Video identifier.
    pub id: String,
    /// Video title.
    pub title: String,
    /// Video description; absent or empty descriptions are not analyzed.
    pub description: Option<String>,
    /// Display name of the owning channel.
    pub channel_title: String,
    /// Identifier of the owning channel.
    pub channel_id: String,
    /// URL of the default thumbnail.
    pub thumbnail_url: String,
    /// Tags attached to the video.
    pub tags: Vec<String>,
}

impl ResultRecord {
    /// Returns the description if it is present and non-empty.
    pub fn analyzable_description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

/// One resolved set of search results for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBatch {
    /// The query that produced these results.
    pub query: String,
    /// Results in provider order.
    pub results: Vec<ResultRecord>,
}

/// Sentiment label for a description or a whole result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SentimentLabel {
    #[serde(rename = ":-)")]
    Happy,
    #[serde(rename = ":-(")]
    Sad,
    #[default]
    #[serde(rename = ":-|")]
    Neutral,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentLabel::Happy => write!(f, ":-)"),
            SentimentLabel::Sad => write!(f, ":-("),
            SentimentLabel::Neutral => write!(f, ":-|"),
        }
    }
}

/// Per-description sentiment labels plus the overall label.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SentimentResult {
    pub per_item: Vec<SentimentLabel>,
    pub overall: SentimentLabel,
}

/// Readability scores of a single description.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReadabilityScores {
    /// Flesch-Kincaid grade level.
    pub grade_level: f64,
    /// Flesch reading ease.
    pub reading_ease: f64,
}

/// Per-description readability scores and their averages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadabilityResult {
    pub per_item: Vec<ReadabilityScores>,
    pub overall_grade: f64,
    pub overall_ease: f64,
}

/// Word frequencies, sorted by count descending with ties in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WordStatResult {
    pub frequencies: Vec<(String, u64)>,
}

impl WordStatResult {
    /// Returns the count recorded for `word`, if any.
    #[allow(dead_code)] // Utility for lookups
    pub fn count_of(&self, word: &str) -> Option<u64> {
        self.frequencies
            .iter()
            .find(|(w, _)| w == word)
            .map(|(_, count)| *count)
    }
}

impl fmt::Display for WordStatResult {
    /// Renders as `{cat=2, dog=1}`, the format clients already parse.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (word, count)) in self.frequencies.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", word, count)?;
        }
        write!(f, "}}")
    }
}

/// The three analyses run against every non-empty batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnalysisKind {
    Sentiment,
    Readability,
    WordStats,
}

impl AnalysisKind {
    /// All analyses, in dispatch order.
    pub const ALL: [AnalysisKind; 3] = [
        AnalysisKind::Sentiment,
        AnalysisKind::Readability,
        AnalysisKind::WordStats,
    ];
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKind::Sentiment => write!(f, "sentiment"),
            AnalysisKind::Readability => write!(f, "readability"),
            AnalysisKind::WordStats => write!(f, "word-stats"),
        }
    }
}

/// Output of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Sentiment(SentimentResult),
    Readability(ReadabilityResult),
    WordStats(WordStatResult),
}

impl AnalysisResult {
    /// The analysis that produced this result.
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisResult::Sentiment(_) => AnalysisKind::Sentiment,
            AnalysisResult::Readability(_) => AnalysisKind::Readability,
            AnalysisResult::WordStats(_) => AnalysisKind::WordStats,
        }
    }

    /// The empty result substituted when an analysis fails or times out.
    pub fn default_for(kind: AnalysisKind) -> Self {
        match kind {
            AnalysisKind::Sentiment => AnalysisResult::Sentiment(SentimentResult::default()),
            AnalysisKind::Readability => AnalysisResult::Readability(ReadabilityResult::default()),
            AnalysisKind::WordStats => AnalysisResult::WordStats(WordStatResult::default()),
        }
    }
}

/// Detailed view of a single video.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// A recent upload listed on a channel profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentVideo {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: String,
}

/// Channel profile with its most recent uploads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub subscriber_count: Option<u64>,
    pub video_count: Option<u64>,
    pub recent_videos: Vec<RecentVideo>,
}

/// A result row as sent to the client, optionally enriched by the analyses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRow {
    pub video_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub channel_title: String,
    pub channel_id: String,
    pub default_thumbnail: String,
    pub tags: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_ease_score: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
}

impl From<ResultRecord> for VideoRow {
    fn from(record: ResultRecord) -> Self {
        let tags = if record.tags.is_empty() {
            "No tags available".to_string()
        } else {
            record.tags.join(", ")
        };

        Self {
            video_id: record.id,
            title: record.title,
            description: record.description,
            channel_title: record.channel_title,
            channel_id: record.channel_id,
            default_thumbnail: record.thumbnail_url,
            tags,
            grade_level: None,
            reading_ease_score: None,
            sentiment: None,
        }
    }
}

impl VideoRow {
    /// Whether any analysis has written into this row.
    #[allow(dead_code)] // Utility for inspection
    pub fn is_enriched(&self) -> bool {
        self.grade_level.is_some() || self.reading_ease_score.is_some() || self.sentiment.is_some()
    }
}

/// One element of the merged response array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Row {
    /// Synthetic first row carrying the aggregate readability scores.
    OverallScores {
        #[serde(rename = "overallGradeLevel")]
        overall_grade_level: String,
        #[serde(rename = "overallEaseScore")]
        overall_ease_score: String,
    },
    /// One search result.
    Video(VideoRow),
    /// Synthetic last row carrying the rendered word frequencies.
    WordStats {
        #[serde(rename = "wordStats")]
        word_stats: String,
    },
}

/// Formats a score the way the wire format expects (`0.0`, `12.5`).
///
/// Magnitudes below 1e-3 or from 1e7 up switch to scientific notation with
/// an upper-case `E` and at least one fractional digit (`5.0E-4`).
pub fn format_score(value: f64) -> String {
    if !value.is_finite() {
        return match value {
            v if v.is_nan() => "NaN".to_string(),
            v if v > 0.0 => "Infinity".to_string(),
            _ => "-Infinity".to_string(),
        };
    }

    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return format!("{:?}", value);
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    if mantissa.contains('.') {
        format!("{}E{}", mantissa, exponent)
    } else {
        format!("{}.0E{}", mantissa, exponent)
    }
}
