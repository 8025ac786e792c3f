//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Most results the YouTube search endpoint returns per page.
pub const MAX_RESULTS_LIMIT: u32 = 50;

/// TubeLytics - concurrent YouTube search analytics
///
/// Reads JSON client commands from stdin, one per line, and writes one JSON
/// envelope per line to stdout. Every search is enriched with sentiment,
/// readability and word statistics computed concurrently.
///
/// Examples:
///   echo '{"action":"search","query":"rust"}' | tubelytics
///   tubelytics --query "rust async" --pretty
///   tubelytics --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Run a single search, print the merged response and exit
    #[arg(short, long, value_name = "QUERY")]
    pub query: Option<String>,

    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// YouTube Data API base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Number of videos fetched per search (1-50)
    #[arg(long, value_name = "COUNT")]
    pub max_results: Option<u32>,

    /// Per-analysis timeout in seconds (0 waits forever)
    #[arg(long, value_name = "SECS")]
    pub analysis_timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .tubelytics.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(long)]
    pub quiet: bool,

    /// Pretty-print the one-shot response
    #[arg(long)]
    pub pretty: bool,

    /// Generate a default .tubelytics.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(max) = self.max_results {
            if max == 0 || max > MAX_RESULTS_LIMIT {
                return Err(format!(
                    "Max results must be between 1 and {}",
                    MAX_RESULTS_LIMIT
                ));
            }
        }

        if let Some(ref query) = self.query {
            if query.trim().is_empty() {
                return Err("Query must not be empty".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }
}
