//! Video search providers.
//!
//! The session coordinator only depends on [`VideoProvider`]; the YouTube
//! Data API client is the production implementation.

pub mod youtube;

pub use youtube::YouTubeClient;

use crate::error::ProviderError;
use crate::models::{ChannelProfile, ResultRecord, VideoDetails};
use async_trait::async_trait;

/// Source of search results and per-item lookups.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Search for videos matching `query`, in relevance order.
    async fn search(&self, query: &str) -> Result<Vec<ResultRecord>, ProviderError>;

    /// Fetch details and statistics of one video.
    async fn video_details(&self, video_id: &str) -> Result<VideoDetails, ProviderError>;

    /// Fetch a channel profile with its recent uploads.
    async fn channel_profile(&self, channel_id: &str) -> Result<ChannelProfile, ProviderError>;
}
