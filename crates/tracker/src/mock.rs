//! Scripted collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::{Value, json};
use snaptrack_protocol::{JobHandle, UploadRequest};
use snaptrack_transfer::{ProgressSink, TransferTick};

use crate::api::{
    CredentialProvider, PushFrame, PushSubscription, PushTransport, StatusApi, UploadTransport,
};
use crate::error::{ApiError, PushError};

/// Status API that replays queued responses, then reports "processing".
#[derive(Default)]
pub(crate) struct ScriptedStatus {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    calls: AtomicUsize,
    auth_seen: Mutex<Vec<Option<String>>>,
}

impl ScriptedStatus {
    pub(crate) fn new(responses: Vec<Result<Value, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        })
    }

    /// Pending on every call.
    pub(crate) fn never_ready() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn auth_seen(&self) -> Vec<Option<String>> {
        self.auth_seen.lock().unwrap().clone()
    }
}

impl StatusApi for ScriptedStatus {
    fn job_status<'a>(
        &'a self,
        _job: &'a JobHandle,
        authorization: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Value, ApiError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.auth_seen
                .lock()
                .unwrap()
                .push(authorization.map(str::to_string));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({"status": "processing"})))
        })
    }
}

/// One step of a scripted push subscription.
#[derive(Clone)]
pub(crate) enum PushStep {
    Wait(Duration),
    Frame(PushFrame),
    Error(PushError),
    Close,
}

pub(crate) fn text(s: &str) -> PushStep {
    PushStep::Frame(PushFrame::Text(s.to_string()))
}

/// Push transport whose single subscription follows a script.
///
/// Once the script runs out the subscription stays silent forever.
pub(crate) struct ScriptedPush {
    steps: Vec<PushStep>,
    connect_error: Option<PushError>,
    urls: Mutex<Vec<String>>,
    closed: Arc<AtomicBool>,
}

impl ScriptedPush {
    pub(crate) fn new(steps: Vec<PushStep>) -> Arc<Self> {
        Arc::new(Self {
            steps,
            connect_error: None,
            urls: Mutex::new(Vec::new()),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub(crate) fn refusing(err: PushError) -> Arc<Self> {
        Arc::new(Self {
            steps: Vec::new(),
            connect_error: Some(err),
            urls: Mutex::new(Vec::new()),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    pub(crate) fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl PushTransport for ScriptedPush {
    fn subscribe<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, Result<Box<dyn PushSubscription>, PushError>> {
        Box::pin(async move {
            self.urls.lock().unwrap().push(url.to_string());
            if let Some(err) = &self.connect_error {
                return Err(err.clone());
            }
            Ok(Box::new(ScriptedSubscription {
                steps: self.steps.clone().into(),
                closed: self.closed.clone(),
            }) as Box<dyn PushSubscription>)
        })
    }
}

struct ScriptedSubscription {
    steps: VecDeque<PushStep>,
    closed: Arc<AtomicBool>,
}

impl PushSubscription for ScriptedSubscription {
    fn next_frame(&mut self) -> BoxFuture<'_, Option<Result<PushFrame, PushError>>> {
        Box::pin(async move {
            loop {
                match self.steps.pop_front() {
                    Some(PushStep::Wait(d)) => tokio::time::sleep(d).await,
                    Some(PushStep::Frame(frame)) => return Some(Ok(frame)),
                    Some(PushStep::Error(err)) => return Some(Err(err)),
                    Some(PushStep::Close) => return None,
                    None => std::future::pending::<()>().await,
                }
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.closed.store(true, Ordering::SeqCst);
        })
    }
}

/// Upload transport that reports scripted ticks, then returns a response.
pub(crate) struct ScriptedUpload {
    ticks: Vec<TransferTick>,
    response: Result<Value, ApiError>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedUpload {
    pub(crate) fn new(ticks: Vec<TransferTick>, response: Result<Value, ApiError>) -> Arc<Self> {
        Arc::new(Self {
            ticks,
            response,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    /// Accepts with `{"jobId": job}` after reporting 0..=100%.
    pub(crate) fn accepting(job: &str) -> Arc<Self> {
        Self::new(
            vec![
                TransferTick {
                    sent: 0,
                    total: Some(100),
                },
                TransferTick {
                    sent: 50,
                    total: Some(100),
                },
                TransferTick {
                    sent: 100,
                    total: Some(100),
                },
            ],
            Ok(json!({ "jobId": job })),
        )
    }

    /// Wait between ticks, so tests can cancel mid-transfer.
    pub(crate) fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            ticks: self.ticks.clone(),
            response: self.response.clone(),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UploadTransport for ScriptedUpload {
    fn upload<'a>(
        &'a self,
        _request: &'a UploadRequest,
        _authorization: Option<&'a str>,
        progress: ProgressSink,
    ) -> BoxFuture<'a, Result<Value, ApiError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for tick in &self.ticks {
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                let _ = progress.send(*tick);
                tokio::task::yield_now().await;
            }
            self.response.clone()
        })
    }
}

/// Fixed bearer token.
pub(crate) struct Token(pub(crate) &'static str);

impl CredentialProvider for Token {
    fn authorization(&self) -> Option<String> {
        Some(format!("Bearer {}", self.0))
    }
}
