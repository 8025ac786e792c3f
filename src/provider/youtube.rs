//! YouTube Data API v3 client.
//!
//! Searches use two calls: `search.list` to find video ids, then
//! `videos.list` to get the full snippet (tags and channel id are not part
//! of search results).

use super::VideoProvider;
use crate::config::YouTubeConfig;
use crate::error::ProviderError;
use crate::models::{ChannelProfile, RecentVideo, ResultRecord, VideoDetails};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client for the YouTube Data API.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    max_results: u32,
    recent_videos: u32,
}

/// `*.list` response envelope.
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    statistics: Option<VideoStatistics>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    description: Option<String>,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    tags: Vec<String>,
    thumbnails: Option<Thumbnails>,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    like_count: Option<String>,
    view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    snippet: Option<ChannelSnippet>,
    statistics: Option<ChannelStatistics>,
    content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
    video_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistSnippet {
    #[serde(default)]
    title: String,
    resource_id: Option<ResourceId>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

impl YouTubeClient {
    /// Create a client from configuration.
    pub fn new(config: &YouTubeConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        if config.api_key.is_none() {
            warn!("No YouTube API key configured; lookups will fail until one is set");
        }

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_results: config.max_results,
            recent_videos: config.recent_videos,
        })
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}/{}", self.api_url, resource)
    }

    /// GET a `*.list` endpoint and decode the response.
    async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let key = self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)?;
        let url = self.endpoint(resource);

        debug!("GET {} {:?}", url, params);

        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", key)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl VideoProvider for YouTubeClient {
    async fn search(&self, query: &str) -> Result<Vec<ResultRecord>, ProviderError> {
        let max_results = self.max_results.to_string();
        let found: ListResponse<SearchItem> = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("type", "video"),
                    ("maxResults", max_results.as_str()),
                    ("q", query),
                ],
            )
            .await?;

        let ids = video_ids(found.items);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids.join(",");
        let videos: ListResponse<VideoItem> = self
            .get("videos", &[("part", "snippet"), ("id", joined.as_str())])
            .await?;

        debug!("Search '{}' returned {} videos", query, videos.items.len());
        Ok(videos.items.into_iter().map(record_from_video).collect())
    }

    async fn video_details(&self, video_id: &str) -> Result<VideoDetails, ProviderError> {
        let videos: ListResponse<VideoItem> = self
            .get("videos", &[("part", "snippet,statistics"), ("id", video_id)])
            .await?;

        videos
            .items
            .into_iter()
            .next()
            .map(details_from_video)
            .ok_or_else(|| ProviderError::NotFound(format!("video {}", video_id)))
    }

    async fn channel_profile(&self, channel_id: &str) -> Result<ChannelProfile, ProviderError> {
        let channels: ListResponse<ChannelItem> = self
            .get(
                "channels",
                &[("part", "snippet,statistics,contentDetails"), ("id", channel_id)],
            )
            .await?;

        let channel = channels
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound(format!("channel {}", channel_id)))?;

        let uploads = channel
            .content_details
            .as_ref()
            .and_then(|d| d.related_playlists.as_ref())
            .and_then(|p| p.uploads.clone());

        let recent_videos = match uploads {
            Some(playlist_id) => {
                let max_results = self.recent_videos.to_string();
                let items: ListResponse<PlaylistItem> = self
                    .get(
                        "playlistItems",
                        &[
                            ("part", "snippet"),
                            ("playlistId", playlist_id.as_str()),
                            ("maxResults", max_results.as_str()),
                        ],
                    )
                    .await?;
                items.items.into_iter().filter_map(recent_from_playlist).collect()
            }
            None => Vec::new(),
        };

        profile_from_channel(channel, recent_videos)
            .ok_or_else(|| ProviderError::NotFound(format!("channel {}", channel_id)))
    }
}

fn video_ids(items: Vec<SearchItem>) -> Vec<String> {
    items.into_iter().filter_map(|item| item.id.video_id).collect()
}

fn default_thumbnail(thumbnails: Option<Thumbnails>) -> String {
    thumbnails
        .and_then(|t| t.default)
        .map(|t| t.url)
        .unwrap_or_default()
}

fn parse_count(count: Option<String>) -> Option<u64> {
    count.and_then(|c| c.parse().ok())
}

fn record_from_video(item: VideoItem) -> ResultRecord {
    let snippet = item.snippet;
    ResultRecord {
        id: item.id,
        title: snippet.title,
        description: snippet.description,
        channel_title: snippet.channel_title,
        channel_id: snippet.channel_id,
        thumbnail_url: default_thumbnail(snippet.thumbnails),
        tags: snippet.tags,
    }
}

fn details_from_video(item: VideoItem) -> VideoDetails {
    let snippet = item.snippet;
    let (likes, views) = match item.statistics {
        Some(stats) => (parse_count(stats.like_count), parse_count(stats.view_count)),
        None => (None, None),
    };

    VideoDetails {
        title: Some(snippet.title),
        description: snippet.description,
        likes,
        views,
        tags: Some(snippet.tags.join(", ")),
        published_at: snippet.published_at,
    }
}

fn profile_from_channel(
    channel: ChannelItem,
    recent_videos: Vec<RecentVideo>,
) -> Option<ChannelProfile> {
    let snippet = channel.snippet?;
    let statistics = channel.statistics?;

    Some(ChannelProfile {
        title: snippet.title,
        description: snippet.description,
        thumbnail: default_thumbnail(snippet.thumbnails),
        subscriber_count: parse_count(statistics.subscriber_count),
        video_count: parse_count(statistics.video_count),
        recent_videos,
    })
}

fn recent_from_playlist(item: PlaylistItem) -> Option<RecentVideo> {
    let snippet = item.snippet;
    let video_id = snippet.resource_id.and_then(|r| r.video_id)?;

    Some(RecentVideo {
        video_id,
        title: snippet.title,
        thumbnail_url: default_thumbnail(snippet.thumbnails),
    })
}
