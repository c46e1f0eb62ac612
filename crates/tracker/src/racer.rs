//! Push/poll completion race.
//!
//! Runs the [`Poller`] and, when available, the [`PushListener`] as sibling
//! tasks under one child cancellation token. The first usable answer wins;
//! the token is then cancelled and both tasks are joined, so nothing from
//! the losing side outlives the race.

use std::sync::Arc;

use snaptrack_protocol::{CompletionSource, JobHandle, ResultId};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{CredentialProvider, PushTransport, StatusApi};
use crate::config::PollPolicy;
use crate::error::{PushError, TrackerError};
use crate::poller::Poller;
use crate::push::PushListener;

/// A resolved completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub result_id: ResultId,
    pub source: CompletionSource,
}

/// Result of a race that was not cancelled.
pub type RaceOutcome = Result<Completion, TrackerError>;

/// Racer lifecycle. `Resolved` and `Cancelled` are absorbing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceState {
    Idle,
    Racing,
    Resolved(RaceOutcome),
    Cancelled,
}

/// Where and how to reach the push channel.
#[derive(Clone)]
pub struct PushRoute {
    pub transport: Arc<dyn PushTransport>,
    pub base: String,
}

type PollTask = JoinHandle<Result<Option<ResultId>, TrackerError>>;
type PushTask = JoinHandle<Result<Option<ResultId>, PushError>>;

/// Races push and poll for a single job.
pub struct CompletionRacer {
    status: Arc<dyn StatusApi>,
    credentials: Arc<dyn CredentialProvider>,
    policy: PollPolicy,
    push: Option<PushRoute>,
    state: RaceState,
}

impl CompletionRacer {
    /// Creates a racer. Push is used only when `push` is `Some`.
    pub fn new(
        status: Arc<dyn StatusApi>,
        credentials: Arc<dyn CredentialProvider>,
        policy: PollPolicy,
        push: Option<PushRoute>,
    ) -> Self {
        Self {
            status,
            credentials,
            policy,
            push,
            state: RaceState::Idle,
        }
    }

    pub fn state(&self) -> &RaceState {
        &self.state
    }

    /// Runs the race for `job`.
    ///
    /// Returns `None` if `cancel` fires first. Both sources have stopped by
    /// the time this returns. Once resolved or cancelled, further calls
    /// return the recorded outcome without starting anything.
    pub async fn run(
        &mut self,
        job: &JobHandle,
        cancel: &CancellationToken,
    ) -> Option<RaceOutcome> {
        match &self.state {
            RaceState::Resolved(outcome) => return Some(outcome.clone()),
            RaceState::Cancelled => return None,
            RaceState::Idle | RaceState::Racing => {}
        }
        self.state = RaceState::Racing;

        let race = cancel.child_token();

        let poller = Poller::new(
            self.status.clone(),
            self.credentials.clone(),
            job.clone(),
            self.policy,
        );
        let mut poll_task: Option<PollTask> = Some(tokio::spawn(poller.run(race.clone())));

        let mut push_task: Option<PushTask> = self.push.as_ref().map(|route| {
            let listener = PushListener::new(route.transport.clone(), &route.base, job);
            debug!(job = %job, url = %listener.url(), "racing push against poll");
            tokio::spawn(listener.run(race.clone()))
        });
        if push_task.is_none() {
            debug!(job = %job, "no push channel, poll only");
        }

        let outcome = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break None,

                joined = join_live(&mut poll_task), if poll_task.is_some() => {
                    poll_task = None;
                    break match joined {
                        Ok(Ok(Some(result_id))) => Some(Ok(Completion {
                            result_id,
                            source: CompletionSource::Poll,
                        })),
                        // Only the outer token cancels the poller early.
                        Ok(Ok(None)) => None,
                        Ok(Err(e)) => Some(Err(e)),
                        Err(e) => {
                            Some(Err(TrackerError::Internal(format!("poll task failed: {e}"))))
                        }
                    };
                }

                joined = join_live(&mut push_task), if push_task.is_some() => {
                    push_task = None;
                    match joined {
                        Ok(Ok(Some(result_id))) => {
                            break Some(Ok(Completion {
                                result_id,
                                source: CompletionSource::Push,
                            }));
                        }
                        Ok(Ok(None)) => {}
                        Ok(Err(e)) => {
                            warn!(
                                job = %job,
                                error = %e,
                                "push channel failed, continuing with polling"
                            );
                        }
                        Err(e) => {
                            warn!(
                                job = %job,
                                error = %e,
                                "push task failed, continuing with polling"
                            );
                        }
                    }
                }
            }
        };

        // Stop the loser and wait for it; a late answer is discarded.
        race.cancel();
        if let Some(task) = poll_task
            && let Err(e) = task.await
        {
            debug!(job = %job, error = %e, "poll task did not finish cleanly");
        }
        if let Some(task) = push_task
            && let Err(e) = task.await
        {
            debug!(job = %job, error = %e, "push task did not finish cleanly");
        }

        match &outcome {
            Some(Ok(c)) => {
                info!(job = %job, result = %c.result_id, source = %c.source, "job completed")
            }
            Some(Err(e)) => warn!(job = %job, error = %e, "job tracking failed"),
            None => debug!(job = %job, "race cancelled"),
        }

        self.state = match &outcome {
            Some(o) => RaceState::Resolved(o.clone()),
            None => RaceState::Cancelled,
        };
        outcome
    }
}

/// Awaits a task that is still live; pends forever once it has been taken.
async fn join_live<T>(task: &mut Option<JoinHandle<T>>) -> Result<T, JoinError> {
    match task.as_mut() {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{NoCredentials, PushFrame, PushSubscription};
    use crate::mock::{PushStep, ScriptedPush, ScriptedStatus, text};
    use futures_util::future::BoxFuture;
    use serde_json::json;
    use snaptrack_protocol::constants::POLL_INTERVAL;
    use std::time::Duration;

    fn racer(status: Arc<ScriptedStatus>, push: Option<Arc<ScriptedPush>>) -> CompletionRacer {
        CompletionRacer::new(
            status,
            Arc::new(NoCredentials),
            PollPolicy::default(),
            push.map(|p| PushRoute {
                transport: p,
                base: "ws://push.local".into(),
            }),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn poll_only_resolves_via_poll() {
        let status = ScriptedStatus::new(vec![
            Ok(json!({})),
            Ok(json!({})),
            Ok(json!({"status": "done", "id": "R1"})),
        ]);
        let mut r = racer(status.clone(), None);
        assert_eq!(r.state(), &RaceState::Idle);

        let outcome = r.run(&JobHandle::new("J1"), &CancellationToken::new()).await;

        let expected = Completion {
            result_id: ResultId::new("R1"),
            source: CompletionSource::Poll,
        };
        assert_eq!(outcome, Some(Ok(expected.clone())));
        assert_eq!(r.state(), &RaceState::Resolved(Ok(expected)));
        assert_eq!(status.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn push_wins_before_first_tick() {
        let status = ScriptedStatus::never_ready();
        let push = ScriptedPush::new(vec![
            PushStep::Wait(Duration::from_millis(500)),
            text(r#"{"resultId":"R2"}"#),
        ]);
        let mut r = racer(status.clone(), Some(push.clone()));

        let outcome = r.run(&JobHandle::new("J1"), &CancellationToken::new()).await;

        assert_eq!(
            outcome,
            Some(Ok(Completion {
                result_id: ResultId::new("R2"),
                source: CompletionSource::Push,
            }))
        );
        assert_eq!(status.calls(), 0);

        // The poller is gone: no request ever fires.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(status.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_wins_and_closes_push() {
        let status = ScriptedStatus::new(vec![Ok(json!({"ready": true, "resultId": "R5"}))]);
        let push = ScriptedPush::new(Vec::new());
        let mut r = racer(status, Some(push.clone()));

        let outcome = r.run(&JobHandle::new("J1"), &CancellationToken::new()).await;

        assert_eq!(outcome.unwrap().unwrap().source, CompletionSource::Poll);
        assert!(push.was_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn push_error_falls_back_to_poll() {
        let status =
            ScriptedStatus::new(vec![Ok(json!({})), Ok(json!({"done": true, "id": "R3"}))]);
        let push = ScriptedPush::new(vec![
            PushStep::Wait(Duration::from_millis(100)),
            PushStep::Error(PushError::Transport("boom".into())),
        ]);
        let mut r = racer(status.clone(), Some(push));

        let outcome = r.run(&JobHandle::new("J1"), &CancellationToken::new()).await;

        assert_eq!(
            outcome,
            Some(Ok(Completion {
                result_id: ResultId::new("R3"),
                source: CompletionSource::Poll,
            }))
        );
        assert_eq!(status.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn simultaneous_answers_resolve_once_via_poll() {
        // Both sources answer on the first poll tick.
        let status = ScriptedStatus::new(vec![Ok(json!({"ready": true, "id": "RP"}))]);
        let push = ScriptedPush::new(vec![
            PushStep::Wait(POLL_INTERVAL),
            text(r#"{"resultId":"RS"}"#),
        ]);
        let mut r = racer(status.clone(), Some(push.clone()));

        let outcome = r.run(&JobHandle::new("J1"), &CancellationToken::new()).await;

        let expected = Completion {
            result_id: ResultId::new("RP"),
            source: CompletionSource::Poll,
        };
        assert_eq!(outcome, Some(Ok(expected.clone())));
        assert_eq!(r.state(), &RaceState::Resolved(Ok(expected)));
        assert_eq!(status.calls(), 1);
        assert!(push.was_closed());
    }

    /// Push subscription that never answers and panics when closed.
    struct PanicOnClose;

    impl PushTransport for PanicOnClose {
        fn subscribe<'a>(
            &'a self,
            _url: &'a str,
        ) -> BoxFuture<'a, Result<Box<dyn PushSubscription>, PushError>> {
            Box::pin(async { Ok(Box::new(PanicOnClose) as Box<dyn PushSubscription>) })
        }
    }

    impl PushSubscription for PanicOnClose {
        fn next_frame(&mut self) -> BoxFuture<'_, Option<Result<PushFrame, PushError>>> {
            Box::pin(std::future::pending())
        }

        fn close(&mut self) -> BoxFuture<'_, ()> {
            Box::pin(async { fail_close() })
        }
    }

    fn fail_close() {
        panic!("close failed");
    }

    #[tokio::test(start_paused = true)]
    async fn losing_task_panic_keeps_winner() {
        let status = ScriptedStatus::new(vec![Ok(json!({"ready": true, "id": "R1"}))]);
        let mut r = CompletionRacer::new(
            status,
            Arc::new(NoCredentials),
            PollPolicy::default(),
            Some(PushRoute {
                transport: Arc::new(PanicOnClose),
                base: "ws://push.local".into(),
            }),
        );

        let outcome = r.run(&JobHandle::new("J1"), &CancellationToken::new()).await;

        let expected = Completion {
            result_id: ResultId::new("R1"),
            source: CompletionSource::Poll,
        };
        assert_eq!(outcome, Some(Ok(expected.clone())));
        assert_eq!(r.state(), &RaceState::Resolved(Ok(expected)));
    }

    #[tokio::test(start_paused = true)]
    async fn push_connect_failure_is_not_fatal() {
        let status = ScriptedStatus::new(vec![Ok(json!({"status": "done", "id": "R4"}))]);
        let push = ScriptedPush::refusing(PushError::Connect("refused".into()));
        let mut r = racer(status, Some(push));

        let outcome = r.run(&JobHandle::new("J1"), &CancellationToken::new()).await;
        assert_eq!(outcome.unwrap().unwrap().result_id, ResultId::new("R4"));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_poll_fails_and_closes_push() {
        let status = ScriptedStatus::never_ready();
        let push = ScriptedPush::new(Vec::new());
        let mut r = CompletionRacer::new(
            status.clone(),
            Arc::new(NoCredentials),
            PollPolicy {
                max_attempts: Some(2),
                ..PollPolicy::default()
            },
            Some(PushRoute {
                transport: push.clone(),
                base: "ws://push.local".into(),
            }),
        );

        let outcome = r.run(&JobHandle::new("J1"), &CancellationToken::new()).await;

        assert_eq!(
            outcome,
            Some(Err(TrackerError::PollExhausted { attempts: 2 }))
        );
        assert!(push.was_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_both_sources() {
        let status = ScriptedStatus::never_ready();
        let push = ScriptedPush::new(Vec::new());
        let cancel = CancellationToken::new();

        let mut r = racer(status.clone(), Some(push.clone()));
        let c = cancel.clone();
        let handle = tokio::spawn(async move {
            let outcome = r.run(&JobHandle::new("J1"), &c).await;
            (outcome, r.state().clone())
        });

        tokio::time::sleep(Duration::from_millis(3000)).await;
        cancel.cancel();
        let (outcome, state) = handle.await.unwrap();

        assert_eq!(outcome, None);
        assert_eq!(state, RaceState::Cancelled);
        assert!(push.was_closed());

        let calls = status.calls();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(status.calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn resolved_racer_does_not_restart() {
        let status = ScriptedStatus::new(vec![Ok(json!({"ready": true, "id": "R1"}))]);
        let mut r = racer(status.clone(), None);
        let job = JobHandle::new("J1");
        let cancel = CancellationToken::new();

        let first = r.run(&job, &cancel).await;
        let second = r.run(&job, &cancel).await;

        assert_eq!(first, second);
        assert_eq!(status.calls(), 1);
    }
}
