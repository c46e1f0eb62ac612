//! Per-upload session state and the ordered event sink.

use snaptrack_protocol::ProgressEvent;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

/// Where a session is in its event sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Uploading,
    Accepted,
    Finished,
}

/// Owns the sending half of a session's event channel.
///
/// Every event passes through [`emit`](Self::emit), which enforces the
/// sequence `Started → Progress* → Accepted → Completed`, with `Failed`
/// allowed at any point before the end. Out-of-phase events are dropped,
/// percent values never decrease, and nothing is sent after a terminal
/// event or once the session is cancelled.
pub(crate) struct UploadSession {
    id: String,
    tx: mpsc::Sender<ProgressEvent>,
    cancel: CancellationToken,
    phase: Phase,
    last_percent: u8,
}

impl UploadSession {
    pub(crate) fn new(
        id: String,
        tx: mpsc::Sender<ProgressEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            tx,
            cancel,
            phase: Phase::Idle,
            last_percent: 0,
        }
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    /// Validates and forwards `event`. Returns `true` if it was delivered.
    ///
    /// A receiver that has gone away cancels the session.
    pub(crate) async fn emit(&mut self, event: ProgressEvent) -> bool {
        if self.cancel.is_cancelled() {
            trace!(session = %self.id, ?event, "session cancelled, dropping event");
            return false;
        }

        let (event, next) = match (self.phase, event) {
            (Phase::Finished, event) => {
                warn!(session = %self.id, ?event, "event after terminal event, dropping");
                return false;
            }
            (Phase::Idle, ProgressEvent::Started) => (ProgressEvent::Started, Phase::Uploading),
            (Phase::Uploading, ProgressEvent::Progress { percent }) => {
                self.last_percent = self.last_percent.max(percent.min(100));
                (
                    ProgressEvent::Progress {
                        percent: self.last_percent,
                    },
                    Phase::Uploading,
                )
            }
            (Phase::Uploading, ProgressEvent::Accepted { job }) => {
                (ProgressEvent::Accepted { job }, Phase::Accepted)
            }
            (Phase::Accepted, event @ ProgressEvent::Completed { .. }) => (event, Phase::Finished),
            (_, event @ ProgressEvent::Failed { .. }) => (event, Phase::Finished),
            (phase, event) => {
                warn!(session = %self.id, ?phase, ?event, "out-of-order event, dropping");
                return false;
            }
        };

        let sent = tokio::select! {
            _ = self.cancel.cancelled() => false,
            r = self.tx.send(event) => r.is_ok(),
        };

        if sent {
            self.phase = next;
        } else if !self.cancel.is_cancelled() {
            trace!(session = %self.id, "event receiver dropped, cancelling session");
            self.cancel.cancel();
        }
        sent
    }
}
