//! Push channel listener.
//!
//! Subscribes to the per-job completion channel and waits for the first
//! message carrying a result identifier. Anything unparseable is skipped;
//! transport failures are reported to the racer, which never treats them as
//! fatal.

use std::sync::Arc;

use snaptrack_protocol::paths::push_url;
use snaptrack_protocol::{JobHandle, ResultId, fields};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::api::{PushFrame, PushTransport};
use crate::error::PushError;

/// Waits for a single push notification for one job.
pub struct PushListener {
    transport: Arc<dyn PushTransport>,
    url: String,
}

impl PushListener {
    /// Targets `{base}/results/{job}`.
    pub fn new(transport: Arc<dyn PushTransport>, base: &str, job: &JobHandle) -> Self {
        Self {
            transport,
            url: push_url(base, job),
        }
    }

    /// Address the listener subscribes to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Subscribes and waits for the first valid result identifier.
    ///
    /// Returns `Ok(None)` when cancelled. The subscription is closed before
    /// returning on every path.
    pub async fn run(self, cancel: CancellationToken) -> Result<Option<ResultId>, PushError> {
        let mut subscription = tokio::select! {
            _ = cancel.cancelled() => return Ok(None),
            s = self.transport.subscribe(&self.url) => s?,
        };
        debug!(url = %self.url, "push subscription open");

        let outcome = loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => break Ok(None),
                f = subscription.next_frame() => f,
            };

            match frame {
                Some(Ok(PushFrame::Text(text))) => {
                    if let Some(result) = parse_message(&text) {
                        break Ok(Some(result));
                    }
                }
                Some(Ok(PushFrame::Binary(data))) => {
                    trace!(len = data.len(), "ignoring binary push frame");
                }
                Some(Err(e)) => break Err(e),
                None => break Err(PushError::Closed),
            }
        };

        subscription.close().await;
        outcome
    }
}

/// Extracts a result identifier from a push message, if it carries one.
pub fn parse_message(text: &str) -> Option<ResultId> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => {
            let result = fields::result_id(&value);
            if result.is_none() {
                trace!("push message without result id, ignoring");
            }
            result
        }
        Err(e) => {
            trace!(error = %e, "malformed push message, ignoring");
            None
        }
    }
}
