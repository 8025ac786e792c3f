//! Concurrent dispatch of the analyses for one batch.
//!
//! Each analysis runs on the blocking pool, bounded by an optional timeout.
//! Whatever happens to it, its worker posts exactly one
//! [`SessionMessage::Analysis`] back to the session mailbox.

use super::SessionMessage;
use crate::analysis::Analyze;
use crate::error::AnalysisError;
use crate::models::{AnalysisKind, AnalysisResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Sending half of a session mailbox.
pub type Mailbox = UnboundedSender<SessionMessage>;

/// Start every analysis for `batch` against `descriptions`.
///
/// Returns immediately; results arrive through `mailbox`.
pub fn dispatch_all(
    batch: u64,
    descriptions: Vec<String>,
    analyzers: Arc<dyn Analyze>,
    mailbox: &Mailbox,
    limit: Option<Duration>,
) {
    let descriptions: Arc<[String]> = descriptions.into();

    for kind in AnalysisKind::ALL {
        let descriptions = Arc::clone(&descriptions);
        let analyzers = Arc::clone(&analyzers);
        let mailbox = mailbox.clone();

        tokio::spawn(async move {
            let outcome = run_bounded(kind, limit, move || analyzers.run(kind, &descriptions)).await;
            let result = match outcome {
                Ok(result) => result,
                Err(e) => {
                    warn!("{} (batch {}), reporting default result", e, batch);
                    AnalysisResult::default_for(kind)
                }
            };

            debug!("{} analysis finished for batch {}", kind, batch);
            if mailbox.send(SessionMessage::Analysis { batch, result }).is_err() {
                debug!("Session closed before {} result for batch {}", kind, batch);
            }
        });
    }
}

/// Run `work` on the blocking pool, giving up after `limit` if set.
pub async fn run_bounded<F>(
    kind: AnalysisKind,
    limit: Option<Duration>,
    work: F,
) -> Result<AnalysisResult, AnalysisError>
where
    F: FnOnce() -> AnalysisResult + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(work);

    let joined = match limit {
        Some(after) => match timeout(after, handle).await {
            Ok(joined) => joined,
            Err(_) => return Err(AnalysisError::TimedOut { kind, after }),
        },
        None => handle.await,
    };

    joined.map_err(|_| AnalysisError::Panicked { kind })
}
