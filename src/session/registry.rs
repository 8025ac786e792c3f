//! Routing of client commands to per-session coordinators.

use super::coordinator::SessionCoordinator;
use super::{ClientCommand, SessionMessage};
use crate::analysis::Analyze;
use crate::provider::VideoProvider;
use crate::sink::{ChannelSink, Envelope};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct SessionHandle {
    mailbox: UnboundedSender<SessionMessage>,
    task: JoinHandle<()>,
}

/// Owns one coordinator task per session id, spawned on first use.
pub struct SessionRegistry {
    sessions: HashMap<String, SessionHandle>,
    provider: Arc<dyn VideoProvider>,
    analyzers: Arc<dyn Analyze>,
    outbound: UnboundedSender<Envelope>,
    analysis_timeout: Option<Duration>,
}

impl SessionRegistry {
    pub fn new(
        provider: Arc<dyn VideoProvider>,
        analyzers: Arc<dyn Analyze>,
        outbound: UnboundedSender<Envelope>,
        analysis_timeout: Option<Duration>,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            provider,
            analyzers,
            outbound,
            analysis_timeout,
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Deliver `command` to the session's coordinator, starting it if needed.
    pub fn route(&mut self, session: &str, command: ClientCommand) {
        let message = SessionMessage::Command(command);

        let message = match self.sessions.get(session) {
            Some(handle) => match handle.mailbox.send(message) {
                Ok(()) => return,
                Err(mpsc::error::SendError(message)) => {
                    warn!("Session '{}' stopped unexpectedly, restarting", session);
                    message
                }
            },
            None => message,
        };

        let handle = self.spawn(session);
        if handle.mailbox.send(message).is_err() {
            warn!("Session '{}' rejected command on start", session);
        }
        self.sessions.insert(session.to_string(), handle);
    }

    fn spawn(&self, session: &str) -> SessionHandle {
        debug!("Starting session '{}'", session);

        let (mailbox, rx) = mpsc::unbounded_channel();
        let sink = Arc::new(ChannelSink::new(session, self.outbound.clone()));
        let coordinator = SessionCoordinator::new(
            session,
            Arc::clone(&self.provider),
            Arc::clone(&self.analyzers),
            sink,
            mailbox.clone(),
            self.analysis_timeout,
        );

        SessionHandle {
            mailbox,
            task: tokio::spawn(coordinator.run(rx)),
        }
    }

    /// Ask every session to close and wait for them. Sessions with a search
    /// in flight finish it first.
    pub async fn shutdown(self) {
        if self.is_empty() {
            return;
        }
        info!("Closing {} session(s)", self.len());

        let tasks: Vec<JoinHandle<()>> = self
            .sessions
            .into_values()
            .map(|handle| {
                // A stopped session has nothing left to flush
                let _ = handle.mailbox.send(SessionMessage::Close);
                handle.task
            })
            .collect();

        for result in join_all(tasks).await {
            if let Err(e) = result {
                warn!("Session task failed: {}", e);
            }
        }
    }
}
