use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use snaptrack_protocol::ProgressEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Ordered event sequence of one upload session.
///
/// Ends after the terminal event, or once the session is cancelled.
/// Dropping the stream cancels the session.
pub struct ProgressStream {
    events: mpsc::Receiver<ProgressEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ProgressStream {
    pub(crate) fn new(
        events: mpsc::Receiver<ProgressEvent>,
        cancel: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            events,
            cancel,
            task: Some(task),
        }
    }

    /// Next event, or `None` once the sequence has ended.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.events.recv().await
    }

    /// Cancels the session and waits until it has released everything.
    ///
    /// Events still buffered are discarded. Safe to call more than once.
    pub async fn cancel(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            debug!(error = %e, "session task ended abnormally");
        }
        self.events.close();
        while self.events.try_recv().is_ok() {}
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called or the
    /// session cancelled itself.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Stream for ProgressStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for ProgressStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
