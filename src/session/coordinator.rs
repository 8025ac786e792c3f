//! Per-session coordinator.
//!
//! The coordinator owns at most one aggregation at a time and processes its
//! mailbox one message at a time. Its behavior depends on [`Mode`]:
//!
//! - `Idle`: every command is accepted.
//! - `Searching`: the provider is resolving a query. Only the matching
//!   search completion moves the session on.
//! - `Awaiting`: analyses are outstanding. Results for the live batch are
//!   merged; anything stale is logged and dropped.
//!
//! Direct lookups (video details, channel profiles, tags) never touch the
//! mode and are served in every state. They are answered even while a batch
//! is awaiting its analyses, not held back until it is merged.

use super::aggregation::AggregationState;
use super::dispatch::{dispatch_all, Mailbox};
use super::{ClientCommand, SessionMessage};
use crate::analysis::Analyze;
use crate::error::ProviderError;
use crate::models::{AnalysisResult, ResultRecord, SearchBatch, VideoDetails};
use crate::provider::VideoProvider;
use crate::sink::{Payload, ResponseSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

const NO_RESULTS: &str = "No results found.";
const SEARCH_IN_PROGRESS: &str = "A search is already in progress.";
const CHANNEL_NOT_FOUND: &str = "Channel profile not found";
const INVALID_TAG: &str = "Invalid tag name";

/// What the coordinator is currently waiting for.
#[derive(Debug)]
pub enum Mode {
    Idle,
    Searching { ticket: u64, query: String },
    Awaiting(AggregationState),
}

/// Drives searches, aggregations and direct lookups for one session.
pub struct SessionCoordinator {
    session: String,
    mode: Mode,
    provider: Arc<dyn VideoProvider>,
    analyzers: Arc<dyn Analyze>,
    sink: Arc<dyn ResponseSink>,
    mailbox: Mailbox,
    analysis_timeout: Option<Duration>,
    next_id: u64,
    closing: bool,
}

impl SessionCoordinator {
    /// Create a coordinator. `mailbox` must feed the receiver later passed
    /// to [`SessionCoordinator::run`].
    pub fn new(
        session: impl Into<String>,
        provider: Arc<dyn VideoProvider>,
        analyzers: Arc<dyn Analyze>,
        sink: Arc<dyn ResponseSink>,
        mailbox: Mailbox,
        analysis_timeout: Option<Duration>,
    ) -> Self {
        Self {
            session: session.into(),
            mode: Mode::Idle,
            provider,
            analyzers,
            sink,
            mailbox,
            analysis_timeout,
            next_id: 1,
            closing: false,
        }
    }

    #[allow(dead_code)] // Inspected by tests
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.mode, Mode::Idle)
    }

    /// Analyses still outstanding for the live batch, 0 outside `Awaiting`.
    pub fn pending_count(&self) -> usize {
        match &self.mode {
            Mode::Awaiting(state) => state.pending_count(),
            _ => 0,
        }
    }

    /// Process the mailbox until closed and idle.
    pub async fn run(mut self, mut rx: UnboundedReceiver<SessionMessage>) {
        debug!("Session '{}' started", self.session);

        while let Some(message) = rx.recv().await {
            self.handle(message);
            if self.closing && self.is_idle() {
                break;
            }
        }

        debug!("Session '{}' stopped", self.session);
    }

    /// Handle one mailbox message.
    pub fn handle(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Command(command) => self.on_command(command),
            SessionMessage::SearchCompleted {
                ticket,
                query,
                outcome,
            } => self.on_search_completed(ticket, query, outcome),
            SessionMessage::Analysis { batch, result } => self.on_analysis(batch, result),
            SessionMessage::Close => {
                debug!(
                    "Session '{}' closing ({} analyses pending)",
                    self.session,
                    self.pending_count()
                );
                self.closing = true;
            }
        }
    }

    fn on_command(&mut self, command: ClientCommand) {
        match command {
            ClientCommand::Search { query } => self.on_search(query),
            ClientCommand::GetVideoDetails { video_id } => self.on_video_details(video_id),
            ClientCommand::GetChannelProfile { channel_id } => self.on_channel_profile(channel_id),
            ClientCommand::GetTagDetails { tag } => self.on_tag(tag),
        }
    }

    fn on_search(&mut self, query: String) {
        match &self.mode {
            Mode::Idle => {}
            Mode::Searching { query: current, .. } => {
                warn!(
                    "Session '{}': rejecting search '{}', still searching for '{}'",
                    self.session, query, current
                );
                self.sink.emit(Payload::notice(query, SEARCH_IN_PROGRESS));
                return;
            }
            Mode::Awaiting(state) => {
                warn!(
                    "Session '{}': rejecting search '{}', '{}' awaits {} analyses",
                    self.session,
                    query,
                    state.query(),
                    state.pending_count()
                );
                self.sink.emit(Payload::notice(query, SEARCH_IN_PROGRESS));
                return;
            }
        }

        let ticket = self.next_id();
        info!("Session '{}': searching for '{}'", self.session, query);
        self.mode = Mode::Searching {
            ticket,
            query: query.clone(),
        };

        let provider = Arc::clone(&self.provider);
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let outcome = provider.search(&query).await;
            let completed = SessionMessage::SearchCompleted {
                ticket,
                query,
                outcome,
            };
            if mailbox.send(completed).is_err() {
                debug!("Session closed before search {} completed", ticket);
            }
        });
    }

    fn on_search_completed(
        &mut self,
        ticket: u64,
        query: String,
        outcome: Result<Vec<ResultRecord>, ProviderError>,
    ) {
        match &self.mode {
            Mode::Searching { ticket: live, .. } if *live == ticket => {}
            _ => {
                warn!(
                    "Session '{}': dropping stale results for '{}' (search {})",
                    self.session, query, ticket
                );
                return;
            }
        }

        self.mode = Mode::Idle;
        match outcome {
            Ok(results) => self.on_search_batch(SearchBatch { query, results }),
            Err(e) => warn!("Session '{}': search '{}' failed: {}", self.session, query, e),
        }
    }

    /// Accept a resolved batch: emit the no-results notice, or fan out the
    /// analyses and switch to `Awaiting`.
    pub fn on_search_batch(&mut self, batch: SearchBatch) {
        if !self.is_idle() {
            warn!(
                "Session '{}': rejecting batch for '{}', another search is in flight",
                self.session, batch.query
            );
            self.sink.emit(Payload::notice(batch.query, SEARCH_IN_PROGRESS));
            return;
        }

        if batch.results.is_empty() {
            info!("Session '{}': no results for '{}'", self.session, batch.query);
            self.sink.emit(Payload::notice(batch.query, NO_RESULTS));
            return;
        }

        let batch_id = self.next_id();
        let (state, descriptions) = AggregationState::new(batch_id, batch);
        debug!(
            "Session '{}': dispatching analyses for '{}' (batch {}, {} descriptions)",
            self.session,
            state.query(),
            batch_id,
            descriptions.len()
        );

        dispatch_all(
            batch_id,
            descriptions,
            Arc::clone(&self.analyzers),
            &self.mailbox,
            self.analysis_timeout,
        );
        self.mode = Mode::Awaiting(state);
    }

    fn on_analysis(&mut self, batch: u64, result: AnalysisResult) {
        let Mode::Awaiting(state) = &mut self.mode else {
            warn!(
                "Session '{}': dropping {} result for batch {}, no aggregation in flight",
                self.session,
                result.kind(),
                batch
            );
            return;
        };

        if state.batch_id() != batch {
            warn!(
                "Session '{}': dropping stale {} result for batch {} (live batch {})",
                self.session,
                result.kind(),
                batch,
                state.batch_id()
            );
            return;
        }

        let kind = result.kind();
        if state.merge(result) {
            debug!(
                "Session '{}': merged {} for '{}', {} pending",
                self.session,
                kind,
                state.query(),
                state.pending_count()
            );
        }

        if state.is_complete() {
            self.finalize();
        }
    }

    fn finalize(&mut self) {
        if let Mode::Awaiting(state) = std::mem::replace(&mut self.mode, Mode::Idle) {
            let response = state.finish();
            info!(
                "Session '{}': emitting {} rows for '{}' (overall sentiment {})",
                self.session,
                response.rows.len(),
                response.query,
                response.overall_sentiment
            );
            self.sink.emit(Payload::Merged(response.rows));
        }
    }

    fn on_video_details(&self, video_id: String) {
        let provider = Arc::clone(&self.provider);
        let sink = Arc::clone(&self.sink);

        tokio::spawn(async move {
            let details = match provider.video_details(&video_id).await {
                Ok(details) => details,
                Err(e) => {
                    warn!("Video details for '{}' unavailable: {}", video_id, e);
                    VideoDetails::default()
                }
            };
            sink.emit(Payload::VideoDetails { video_id, details });
        });
    }

    fn on_channel_profile(&self, channel_id: String) {
        let provider = Arc::clone(&self.provider);
        let sink = Arc::clone(&self.sink);

        tokio::spawn(async move {
            match provider.channel_profile(&channel_id).await {
                Ok(profile) => sink.emit(Payload::ChannelProfile { profile }),
                Err(e) => {
                    warn!("Channel profile for '{}' unavailable: {}", channel_id, e);
                    sink.emit(Payload::error(CHANNEL_NOT_FOUND));
                }
            }
        });
    }

    fn on_tag(&self, tag: String) {
        if tag.trim().is_empty() {
            self.sink.emit(Payload::error(INVALID_TAG));
        } else {
            self.sink
                .emit(Payload::Text(format!("You clicked on the tag: {}", tag)));
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyzers;
    use crate::config::AnalysisConfig;
    use crate::models::{AnalysisKind, ChannelProfile, Row, SentimentLabel};
    use crate::sink::{ChannelSink, Envelope};
    use async_trait::async_trait;
    use tokio::sync::mpsc::{self, error::TryRecvError};

    struct FakeProvider {
        records: Vec<ResultRecord>,
        fail: bool,
    }

    #[async_trait]
    impl VideoProvider for FakeProvider {
        async fn search(&self, _query: &str) -> Result<Vec<ResultRecord>, ProviderError> {
            if self.fail {
                return Err(ProviderError::MissingApiKey);
            }
            Ok(self.records.clone())
        }

        async fn video_details(&self, video_id: &str) -> Result<VideoDetails, ProviderError> {
            match video_id {
                "v1" => Ok(VideoDetails {
                    title: Some("First".to_string()),
                    views: Some(10),
                    ..VideoDetails::default()
                }),
                other => Err(ProviderError::NotFound(other.to_string())),
            }
        }

        async fn channel_profile(&self, channel_id: &str) -> Result<ChannelProfile, ProviderError> {
            match channel_id {
                "UC1" => Ok(ChannelProfile {
                    title: "Channel".to_string(),
                    description: String::new(),
                    thumbnail: "http://img".to_string(),
                    subscriber_count: Some(5),
                    video_count: Some(2),
                    recent_videos: vec![],
                }),
                other => Err(ProviderError::NotFound(other.to_string())),
            }
        }
    }

    struct Harness {
        coordinator: SessionCoordinator,
        mailbox: Mailbox,
        inbox: UnboundedReceiver<SessionMessage>,
        outbox: UnboundedReceiver<Envelope>,
    }

    fn record(id: &str, description: &str) -> ResultRecord {
        ResultRecord {
            id: id.to_string(),
            title: format!("Video {}", id),
            description: Some(description.to_string()),
            channel_title: "Channel".to_string(),
            channel_id: "UC1".to_string(),
            thumbnail_url: format!("http://img/{}", id),
            tags: vec!["tag".to_string()],
        }
    }

    fn sample_records() -> Vec<ResultRecord> {
        vec![
            record("a", "What a great and happy day, wonderful news."),
            record("b", ""),
            record("c", "Sad and terrible weather. The day was bad!"),
        ]
    }

    /// Analyses that misbehave for selected kinds.
    enum Fault {
        Stall(Duration),
        Panic,
    }

    struct FaultyAnalyzers {
        inner: Analyzers,
        faults: Vec<(AnalysisKind, Fault)>,
    }

    impl Analyze for FaultyAnalyzers {
        fn run(&self, kind: AnalysisKind, descriptions: &[String]) -> AnalysisResult {
            match self.faults.iter().find(|(k, _)| *k == kind) {
                Some((_, Fault::Stall(delay))) => std::thread::sleep(*delay),
                Some((_, Fault::Panic)) => panic!("{} analysis blew up", kind),
                None => {}
            }
            self.inner.run(kind, descriptions)
        }
    }

    fn default_analyzers() -> Analyzers {
        Analyzers::from_config(&AnalysisConfig::default()).unwrap()
    }

    fn harness(provider: FakeProvider) -> Harness {
        harness_with(
            provider,
            Arc::new(default_analyzers()),
            Some(Duration::from_secs(5)),
        )
    }

    fn harness_with(
        provider: FakeProvider,
        analyzers: Arc<dyn Analyze>,
        analysis_timeout: Option<Duration>,
    ) -> Harness {
        let (mailbox, inbox) = mpsc::unbounded_channel();
        let (out_tx, outbox) = mpsc::unbounded_channel();
        let coordinator = SessionCoordinator::new(
            "test",
            Arc::new(provider),
            analyzers,
            Arc::new(ChannelSink::new("test", out_tx)),
            mailbox.clone(),
            analysis_timeout,
        );

        Harness {
            coordinator,
            mailbox,
            inbox,
            outbox,
        }
    }

    fn provider_with(records: Vec<ResultRecord>) -> FakeProvider {
        FakeProvider {
            records,
            fail: false,
        }
    }

    fn batch(records: Vec<ResultRecord>) -> SearchBatch {
        SearchBatch {
            query: "weather".to_string(),
            results: records,
        }
    }

    /// Receive the three analysis messages, ordered by analysis kind.
    async fn analysis_messages(inbox: &mut UnboundedReceiver<SessionMessage>) -> Vec<SessionMessage> {
        let mut messages = Vec::new();
        for _ in 0..3 {
            let message = inbox.recv().await.unwrap();
            assert!(matches!(message, SessionMessage::Analysis { .. }));
            messages.push(message);
        }
        messages.sort_by_key(|m| match m {
            SessionMessage::Analysis { result, .. } => result.kind(),
            _ => unreachable!(),
        });
        messages
    }

    fn merged_rows(envelope: Envelope) -> Vec<Row> {
        match envelope.payload {
            Payload::Merged(rows) => rows,
            other => panic!("expected merged rows, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_batch_emits_notice_without_dispatch() {
        let mut h = harness(provider_with(vec![]));

        h.coordinator.on_search_batch(batch(vec![]));

        assert!(h.coordinator.is_idle());
        assert_eq!(
            h.outbox.try_recv().unwrap().payload,
            Payload::notice("weather", NO_RESULTS)
        );
        assert!(matches!(h.inbox.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_emits_once_after_all_three_results() {
        let mut h = harness(provider_with(vec![]));

        h.coordinator.on_search_batch(batch(sample_records()));
        assert_eq!(h.coordinator.pending_count(), 3);

        let messages = analysis_messages(&mut h.inbox).await;
        for (i, message) in messages.into_iter().enumerate() {
            assert!(h.outbox.try_recv().is_err(), "emitted with {} results", i);
            h.coordinator.handle(message);
            assert_eq!(h.coordinator.pending_count(), 2 - i);
        }

        assert!(h.coordinator.is_idle());
        let rows = merged_rows(h.outbox.try_recv().unwrap());
        assert_eq!(rows.len(), 5);
        assert!(h.outbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_all_arrival_orders_produce_identical_payload() {
        const ORDERS: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];

        let mut payloads = Vec::new();
        for order in ORDERS {
            let mut h = harness(provider_with(vec![]));
            h.coordinator.on_search_batch(batch(sample_records()));

            let mut slots: Vec<Option<SessionMessage>> = analysis_messages(&mut h.inbox)
                .await
                .into_iter()
                .map(Some)
                .collect();
            for i in order {
                h.coordinator.handle(slots[i].take().unwrap());
            }

            let envelope = h.outbox.try_recv().unwrap();
            payloads.push(serde_json::to_string(&envelope.payload).unwrap());
        }

        assert!(payloads.iter().all(|p| p == &payloads[0]));
    }

    #[tokio::test]
    async fn test_row_zero_is_overall_scores_and_empty_description_is_untouched() {
        let mut h = harness(provider_with(vec![]));
        h.coordinator.on_search_batch(batch(vec![
            record("a", "Great day!"),
            record("b", ""),
        ]));

        for message in analysis_messages(&mut h.inbox).await {
            h.coordinator.handle(message);
        }

        let rows = merged_rows(h.outbox.try_recv().unwrap());
        assert_eq!(rows.len(), 4);
        assert!(matches!(rows[0], Row::OverallScores { .. }));

        match &rows[1] {
            Row::Video(row) => {
                assert_eq!(row.video_id, "a");
                assert_eq!(row.sentiment.as_deref(), Some(":-)"));
                assert!(row.grade_level.is_some());
                assert!(row.reading_ease_score.is_some());
            }
            other => panic!("unexpected row: {:?}", other),
        }
        match &rows[2] {
            Row::Video(row) => {
                assert_eq!(row.video_id, "b");
                assert!(!row.is_enriched());
            }
            other => panic!("unexpected row: {:?}", other),
        }
        assert_eq!(
            rows[3],
            Row::WordStats {
                word_stats: "{great=1, day=1}".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_timed_out_analyses_merge_as_defaults() {
        let analyzers = FaultyAnalyzers {
            inner: default_analyzers(),
            faults: vec![
                (AnalysisKind::Readability, Fault::Stall(Duration::from_millis(300))),
                (AnalysisKind::WordStats, Fault::Stall(Duration::from_millis(300))),
            ],
        };
        let mut h = harness_with(
            provider_with(vec![]),
            Arc::new(analyzers),
            Some(Duration::from_millis(20)),
        );

        h.coordinator.on_search_batch(batch(vec![
            record("a", "What a great and happy day!"),
            record("b", ""),
        ]));
        assert_eq!(h.coordinator.pending_count(), 3);

        for message in analysis_messages(&mut h.inbox).await {
            h.coordinator.handle(message);
        }

        assert_eq!(h.coordinator.pending_count(), 0);
        assert!(h.coordinator.is_idle());

        let rows = merged_rows(h.outbox.try_recv().unwrap());
        assert!(h.outbox.try_recv().is_err());
        assert_eq!(rows.len(), 4);

        assert_eq!(
            serde_json::to_string(&rows[0]).unwrap(),
            r#"{"overallGradeLevel":"0.0","overallEaseScore":"0.0"}"#
        );
        match &rows[1] {
            Row::Video(row) => {
                assert_eq!(row.sentiment.as_deref(), Some(":-)"));
                assert!(row.grade_level.is_none());
                assert!(row.reading_ease_score.is_none());
            }
            other => panic!("unexpected row: {:?}", other),
        }
        assert_eq!(
            serde_json::to_string(&rows[3]).unwrap(),
            r#"{"wordStats":"{}"}"#
        );
    }

    #[tokio::test]
    async fn test_panicked_analysis_does_not_block_the_merge() {
        let analyzers = FaultyAnalyzers {
            inner: default_analyzers(),
            faults: vec![(AnalysisKind::Sentiment, Fault::Panic)],
        };
        let mut h = harness_with(provider_with(vec![]), Arc::new(analyzers), None);

        h.coordinator.on_search_batch(batch(vec![record("a", "Great day!")]));
        for message in analysis_messages(&mut h.inbox).await {
            h.coordinator.handle(message);
        }

        assert!(h.coordinator.is_idle());
        let rows = merged_rows(h.outbox.try_recv().unwrap());
        match &rows[1] {
            Row::Video(row) => {
                assert!(row.sentiment.is_none());
                assert!(row.grade_level.is_some());
            }
            other => panic!("unexpected row: {:?}", other),
        }
        assert_eq!(
            rows[2],
            Row::WordStats {
                word_stats: "{great=1, day=1}".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_stale_result_is_dropped_and_next_batch_succeeds() {
        let mut h = harness(provider_with(vec![]));

        h.coordinator.handle(SessionMessage::Analysis {
            batch: 42,
            result: AnalysisResult::default_for(AnalysisKind::Sentiment),
        });
        assert!(h.coordinator.is_idle());
        assert!(h.outbox.try_recv().is_err());

        h.coordinator.on_search_batch(batch(sample_records()));
        for message in analysis_messages(&mut h.inbox).await {
            h.coordinator.handle(message);
        }
        assert_eq!(merged_rows(h.outbox.try_recv().unwrap()).len(), 5);
    }

    #[tokio::test]
    async fn test_result_for_old_batch_is_dropped_while_awaiting() {
        let mut h = harness(provider_with(vec![]));
        h.coordinator.on_search_batch(batch(sample_records()));

        h.coordinator.handle(SessionMessage::Analysis {
            batch: 999,
            result: AnalysisResult::default_for(AnalysisKind::WordStats),
        });
        assert_eq!(h.coordinator.pending_count(), 3);
    }

    #[tokio::test]
    async fn test_overlapping_search_is_rejected() {
        let mut h = harness(provider_with(sample_records()));

        h.coordinator.handle(SessionMessage::Command(ClientCommand::Search {
            query: "first".to_string(),
        }));
        assert!(matches!(h.coordinator.mode(), Mode::Searching { query, .. } if query == "first"));

        h.coordinator.handle(SessionMessage::Command(ClientCommand::Search {
            query: "second".to_string(),
        }));
        assert_eq!(
            h.outbox.try_recv().unwrap().payload,
            Payload::notice("second", SEARCH_IN_PROGRESS)
        );

        let completed = h.inbox.recv().await.unwrap();
        h.coordinator.handle(completed);
        assert_eq!(h.coordinator.pending_count(), 3);

        h.coordinator.handle(SessionMessage::Command(ClientCommand::Search {
            query: "third".to_string(),
        }));
        assert_eq!(
            h.outbox.try_recv().unwrap().payload,
            Payload::notice("third", SEARCH_IN_PROGRESS)
        );
        assert_eq!(h.coordinator.pending_count(), 3);
    }

    #[tokio::test]
    async fn test_search_command_runs_full_cycle() {
        let mut h = harness(provider_with(sample_records()));

        h.coordinator.handle(SessionMessage::Command(ClientCommand::Search {
            query: "weather".to_string(),
        }));
        let completed = h.inbox.recv().await.unwrap();
        assert!(matches!(completed, SessionMessage::SearchCompleted { .. }));
        h.coordinator.handle(completed);

        for message in analysis_messages(&mut h.inbox).await {
            h.coordinator.handle(message);
        }

        let envelope = h.outbox.try_recv().unwrap();
        assert_eq!(envelope.session, "test");
        assert_eq!(merged_rows(envelope).len(), 5);
        assert!(h.coordinator.is_idle());
    }

    #[tokio::test]
    async fn test_stale_search_completion_is_dropped() {
        let mut h = harness(provider_with(sample_records()));

        h.coordinator.handle(SessionMessage::SearchCompleted {
            ticket: 77,
            query: "old".to_string(),
            outcome: Ok(sample_records()),
        });

        assert!(h.coordinator.is_idle());
        assert!(h.outbox.try_recv().is_err());
        assert!(h.inbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_search_failure_returns_to_idle_silently() {
        let mut h = harness(FakeProvider {
            records: vec![],
            fail: true,
        });

        h.coordinator.handle(SessionMessage::Command(ClientCommand::Search {
            query: "weather".to_string(),
        }));
        let completed = h.inbox.recv().await.unwrap();
        h.coordinator.handle(completed);

        assert!(h.coordinator.is_idle());
        assert!(h.outbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_tag_details() {
        let mut h = harness(provider_with(vec![]));

        h.coordinator.handle(SessionMessage::Command(ClientCommand::GetTagDetails {
            tag: "rust".to_string(),
        }));
        h.coordinator.handle(SessionMessage::Command(ClientCommand::GetTagDetails {
            tag: " ".to_string(),
        }));

        assert_eq!(
            h.outbox.try_recv().unwrap().payload,
            Payload::Text("You clicked on the tag: rust".to_string())
        );
        assert_eq!(
            h.outbox.try_recv().unwrap().payload,
            Payload::error(INVALID_TAG)
        );
    }

    #[tokio::test]
    async fn test_direct_lookups_are_served_while_awaiting() {
        let mut h = harness(provider_with(vec![]));
        h.coordinator.on_search_batch(batch(sample_records()));

        h.coordinator.handle(SessionMessage::Command(ClientCommand::GetVideoDetails {
            video_id: "v1".to_string(),
        }));
        match h.outbox.recv().await.unwrap().payload {
            Payload::VideoDetails { video_id, details } => {
                assert_eq!(video_id, "v1");
                assert_eq!(details.title.as_deref(), Some("First"));
            }
            other => panic!("unexpected payload: {:?}", other),
        }

        h.coordinator.handle(SessionMessage::Command(ClientCommand::GetChannelProfile {
            channel_id: "missing".to_string(),
        }));
        assert_eq!(
            h.outbox.recv().await.unwrap().payload,
            Payload::error(CHANNEL_NOT_FOUND)
        );

        assert_eq!(h.coordinator.pending_count(), 3);
    }

    #[tokio::test]
    async fn test_unknown_video_gives_empty_details() {
        let mut h = harness(provider_with(vec![]));

        h.coordinator.handle(SessionMessage::Command(ClientCommand::GetVideoDetails {
            video_id: "nope".to_string(),
        }));

        assert_eq!(
            h.outbox.recv().await.unwrap().payload,
            Payload::VideoDetails {
                video_id: "nope".to_string(),
                details: VideoDetails::default(),
            }
        );
    }

    #[tokio::test]
    async fn test_run_finishes_in_flight_search_before_closing() {
        let Harness {
            coordinator,
            mailbox,
            inbox,
            mut outbox,
        } = harness(provider_with(sample_records()));

        mailbox
            .send(SessionMessage::Command(ClientCommand::Search {
                query: "weather".to_string(),
            }))
            .unwrap();
        mailbox.send(SessionMessage::Close).unwrap();

        let task = tokio::spawn(coordinator.run(inbox));
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();

        let rows = merged_rows(outbox.recv().await.unwrap());
        assert_eq!(rows.len(), 5);
    }

    #[tokio::test]
    async fn test_overall_sentiment_stays_off_the_wire() {
        let mut h = harness(provider_with(vec![]));
        h.coordinator.on_search_batch(batch(vec![record("a", "Great day!")]));
        for message in analysis_messages(&mut h.inbox).await {
            h.coordinator.handle(message);
        }

        let json = serde_json::to_value(h.outbox.try_recv().unwrap().payload).unwrap();
        let overall = json[0].as_object().unwrap();
        assert_eq!(overall.len(), 2);
        assert!(overall.contains_key("overallGradeLevel"));
        assert!(overall.contains_key("overallEaseScore"));
        assert_eq!(json[1]["sentiment"], SentimentLabel::Happy.to_string());
    }
}
