//! Error types for the provider and analysis boundaries.
//!
//! Both are recovered locally by the session coordinator: provider failures
//! are logged, analysis failures are replaced by the analysis' default result.

use crate::models::AnalysisKind;
use std::time::Duration;
use thiserror::Error;

/// Failure talking to the video search provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No YouTube API key configured (set YOUTUBE_API_KEY or [youtube].api_key)")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YouTube API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode YouTube response: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Failure of a dispatched analysis worker.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("{kind} analysis timed out after {after:?}")]
    TimedOut { kind: AnalysisKind, after: Duration },

    #[error("{kind} analysis panicked")]
    Panicked { kind: AnalysisKind },
}
