//! Outbound side of a client session.
//!
//! Sessions hand payloads to a [`ResponseSink`] and never wait on it. The
//! process-wide writer drains the channel behind [`ChannelSink`] and prints
//! one [`Envelope`] per line.

use crate::models::{ChannelProfile, Row, VideoDetails};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Message sent to a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// The merged, enriched search response.
    Merged(Vec<Row>),
    /// Informational notice about a query (no results, search rejected).
    Notice { query: String, message: String },
    /// Reply to a video details lookup.
    VideoDetails {
        #[serde(rename = "videoId")]
        video_id: String,
        #[serde(rename = "videoDetails")]
        details: VideoDetails,
    },
    /// Reply to a channel profile lookup.
    ChannelProfile {
        #[serde(rename = "profileData")]
        profile: ChannelProfile,
    },
    /// A failed direct lookup.
    Error { error: String },
    /// Plain text acknowledgement.
    Text(String),
}

impl Payload {
    pub fn notice(query: impl Into<String>, message: impl Into<String>) -> Self {
        Payload::Notice {
            query: query.into(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Payload::Error {
            error: message.into(),
        }
    }
}

/// A payload addressed to one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub session: String,
    pub payload: Payload,
}

/// Write-only channel back to the client. Emission never blocks or fails.
pub trait ResponseSink: Send + Sync {
    fn emit(&self, payload: Payload);
}

/// Sink that forwards payloads, tagged with their session, to a channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    session: String,
    tx: UnboundedSender<Envelope>,
}

impl ChannelSink {
    pub fn new(session: impl Into<String>, tx: UnboundedSender<Envelope>) -> Self {
        Self {
            session: session.into(),
            tx,
        }
    }
}

impl ResponseSink for ChannelSink {
    fn emit(&self, payload: Payload) {
        let envelope = Envelope {
            session: self.session.clone(),
            payload,
        };
        if self.tx.send(envelope).is_err() {
            debug!("Dropping payload for session {}: writer closed", self.session);
        }
    }
}
