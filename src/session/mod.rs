//! Client sessions and the search fan-out/fan-in coordinator.
//!
//! Each session is served by one coordinator task that processes its
//! mailbox strictly in order. A search fans out to the three analyses;
//! their results come back through the same mailbox and are merged into a
//! single response once all of them have reported.

pub mod aggregation;
pub mod coordinator;
pub mod dispatch;
pub mod registry;

pub use registry::SessionRegistry;

use crate::error::ProviderError;
use crate::models::{AnalysisResult, ResultRecord};
use serde::Deserialize;

/// A command sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClientCommand {
    Search {
        query: String,
    },
    GetVideoDetails {
        #[serde(rename = "videoId")]
        video_id: String,
    },
    GetChannelProfile {
        #[serde(rename = "channelId")]
        channel_id: String,
    },
    GetTagDetails {
        tag: String,
    },
}

/// One line of client input: a command, optionally addressed to a session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Inbound {
    #[serde(default)]
    pub session: Option<String>,
    #[serde(flatten)]
    pub command: ClientCommand,
}

/// Everything a coordinator's mailbox can receive.
#[derive(Debug)]
pub enum SessionMessage {
    /// A command from the client.
    Command(ClientCommand),
    /// The provider finished the search identified by `ticket`.
    SearchCompleted {
        ticket: u64,
        query: String,
        outcome: Result<Vec<ResultRecord>, ProviderError>,
    },
    /// An analysis dispatched for aggregation `batch` reported.
    Analysis { batch: u64, result: AnalysisResult },
    /// Stop once no search or aggregation is in flight.
    Close,
}
