//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.tubelytics.toml` files.

use crate::cli::{Args, MAX_RESULTS_LIMIT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".tubelytics.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// YouTube Data API settings.
    #[serde(default)]
    pub youtube: YouTubeConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Pretty-print JSON in one-shot mode.
    #[serde(default)]
    pub pretty: bool,
}

/// YouTube Data API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    /// Base URL of the Data API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key. Usually supplied through YOUTUBE_API_KEY instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Results requested per search.
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Recent uploads listed on a channel profile.
    #[serde(default = "default_max_results")]
    pub recent_videos: u32,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            max_results: default_max_results(),
            recent_videos: default_max_results(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_max_results() -> u32 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

/// Analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Per-analysis timeout in seconds. 0 waits forever.
    #[serde(default = "default_analysis_timeout")]
    pub timeout_seconds: u64,

    /// Keywords counted as happy.
    #[serde(default = "default_happy_keywords")]
    pub happy_keywords: Vec<String>,

    /// Keywords counted as sad.
    #[serde(default = "default_sad_keywords")]
    pub sad_keywords: Vec<String>,

    /// File with one happy keyword per line; replaces `happy_keywords`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub happy_keywords_file: Option<PathBuf>,

    /// File with one sad keyword per line; replaces `sad_keywords`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sad_keywords_file: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_analysis_timeout(),
            happy_keywords: default_happy_keywords(),
            sad_keywords: default_sad_keywords(),
            happy_keywords_file: None,
            sad_keywords_file: None,
        }
    }
}

impl AnalysisConfig {
    /// The per-analysis deadline, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

fn default_analysis_timeout() -> u64 {
    30
}

fn default_happy_keywords() -> Vec<String> {
    vec![
        "happy", "joy", "love", "great", "awesome", "amazing", "fun", "excited", "wonderful",
        "best", "good", "smile", "laugh", "enjoy", "fantastic", "beautiful",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_sad_keywords() -> Vec<String> {
    vec![
        "sad",
        "cry",
        "angry",
        "hate",
        "terrible",
        "awful",
        "worst",
        "bad",
        "pain",
        "lonely",
        "depressed",
        "tragic",
        "loss",
        "hurt",
        "disappointed",
        "broken",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session used for commands that don't name one.
    #[serde(default = "default_session")]
    pub default_session: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_session: default_session(),
        }
    }
}

fn default_session() -> String {
    "default".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.tubelytics.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref key) = args.api_key {
            self.youtube.api_key = Some(key.clone());
        }
        if let Some(ref url) = args.api_url {
            self.youtube.api_url = url.clone();
        }
        if let Some(max_results) = args.max_results {
            self.youtube.max_results = max_results;
        }
        if let Some(timeout) = args.analysis_timeout {
            self.analysis.timeout_seconds = timeout;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
        if args.pretty {
            self.general.pretty = true;
        }
    }

    /// Validate the merged configuration.
    ///
    /// The CLI checks its own flags, but values from the config file only
    /// meet these limits here.
    pub fn validate(&self) -> Result<(), String> {
        let url = &self.youtube.api_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!(
                "[youtube] api_url must start with 'http://' or 'https://', got '{}'",
                url
            ));
        }

        for (name, value) in [
            ("max_results", self.youtube.max_results),
            ("recent_videos", self.youtube.recent_videos),
        ] {
            if value == 0 || value > MAX_RESULTS_LIMIT {
                return Err(format!(
                    "[youtube] {} must be between 1 and {}, got {}",
                    name, MAX_RESULTS_LIMIT, value
                ));
            }
        }

        Ok(())
    }

    /// Log level after merging: `--quiet` wins, then verbose from either
    /// the file or the command line.
    pub fn log_level(&self, args: &Args) -> tracing::Level {
        if args.quiet {
            tracing::Level::ERROR
        } else if self.general.verbose || args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
