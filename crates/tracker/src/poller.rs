//! Fixed-interval status polling.

use std::sync::Arc;
use std::time::Duration;

use snaptrack_protocol::fields::{self, PollStatus};
use snaptrack_protocol::{JobHandle, ResultId};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::api::{CredentialProvider, StatusApi};
use crate::config::PollPolicy;
use crate::error::TrackerError;

/// Shortest interval accepted; `tokio::time::interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Polls the status endpoint for one job until it reports a result.
///
/// A failed request counts as "not ready". Single use: [`run`](Self::run)
/// consumes the poller.
pub struct Poller {
    api: Arc<dyn StatusApi>,
    credentials: Arc<dyn CredentialProvider>,
    job: JobHandle,
    policy: PollPolicy,
}

impl Poller {
    pub fn new(
        api: Arc<dyn StatusApi>,
        credentials: Arc<dyn CredentialProvider>,
        job: JobHandle,
        policy: PollPolicy,
    ) -> Self {
        Self {
            api,
            credentials,
            job,
            policy,
        }
    }

    /// Polls until the job is ready.
    ///
    /// Returns `Ok(None)` when cancelled. Fails only when the configured
    /// attempt bound is exhausted.
    pub async fn run(self, cancel: CancellationToken) -> Result<Option<ResultId>, TrackerError> {
        let max_attempts = self.policy.max_attempts.filter(|m| *m > 0);
        let mut ticker = tokio::time::interval(self.policy.interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // Skip immediate first tick.

        let mut attempts: u32 = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(None),
                _ = ticker.tick() => {}
            }

            attempts = attempts.saturating_add(1);
            let auth = self.credentials.authorization();

            let response = tokio::select! {
                _ = cancel.cancelled() => return Ok(None),
                r = self.api.job_status(&self.job, auth.as_deref()) => r,
            };

            match response {
                Ok(body) => match fields::poll_status(&body) {
                    PollStatus::Ready(result) => {
                        debug!(job = %self.job, attempt = attempts, result = %result, "job ready");
                        return Ok(Some(result));
                    }
                    PollStatus::Pending => {
                        trace!(job = %self.job, attempt = attempts, "job not ready");
                    }
                },
                Err(e) => {
                    debug!(
                        job = %self.job,
                        attempt = attempts,
                        error = %e,
                        "status check failed, treating as not ready"
                    );
                }
            }

            if let Some(max) = max_attempts
                && attempts >= max
            {
                return Err(TrackerError::PollExhausted { attempts });
            }
        }
    }
}
