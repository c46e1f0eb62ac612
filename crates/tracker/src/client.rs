//! Upload entry point.
//!
//! [`TransferClient::upload`] spawns one session task per request. The task
//! performs the transfer, reports progress, and on acceptance hands the job
//! to a [`CompletionRacer`]. Everything it produces flows through the
//! session's ordered sink into the returned [`ProgressStream`].

use std::sync::Arc;

use snaptrack_protocol::{JobHandle, ProgressEvent, UploadRequest, fields};
use snaptrack_transfer::PercentTracker;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, trace};

use crate::api::{CredentialProvider, NoCredentials, PushTransport, StatusApi, UploadTransport};
use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::racer::{Completion, CompletionRacer, PushRoute};
use crate::session::UploadSession;
use crate::stream::ProgressStream;

/// Uploads assets and tracks the resulting jobs to completion.
///
/// Capabilities the environment lacks are simply not injected: without an
/// upload transport every session fails immediately, and without a push
/// transport (or push base) completion is detected by polling alone.
#[derive(Clone)]
pub struct TransferClient {
    upload: Option<Arc<dyn UploadTransport>>,
    status: Arc<dyn StatusApi>,
    push: Option<Arc<dyn PushTransport>>,
    credentials: Arc<dyn CredentialProvider>,
    config: TrackerConfig,
}

impl TransferClient {
    pub fn new(status: Arc<dyn StatusApi>) -> Self {
        Self {
            upload: None,
            status,
            push: None,
            credentials: Arc::new(NoCredentials),
            config: TrackerConfig::default(),
        }
    }

    pub fn with_upload(mut self, upload: Arc<dyn UploadTransport>) -> Self {
        self.upload = Some(upload);
        self
    }

    pub fn with_push(mut self, push: Arc<dyn PushTransport>) -> Self {
        self.push = Some(push);
        self
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Starts an upload session.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn upload(&self, request: &UploadRequest) -> ProgressStream {
        let (tx, rx) = mpsc::channel(self.config.event_buffer.max(1));
        let cancel = CancellationToken::new();
        let id = uuid::Uuid::new_v4().to_string();
        let span = info_span!("upload", session = %id);

        let session = UploadSession::new(id, tx, cancel.clone());
        let task =
            tokio::spawn(run_session(self.clone(), request.clone(), session).instrument(span));
        ProgressStream::new(rx, cancel, task)
    }

    fn push_route(&self) -> Option<PushRoute> {
        let base = self.config.push_base()?;
        let transport = self.push.clone()?;
        Some(PushRoute {
            transport,
            base: base.to_string(),
        })
    }
}

async fn run_session(client: TransferClient, request: UploadRequest, mut session: UploadSession) {
    debug!(
        file = request.file_name(),
        bytes = request.len(),
        "session started"
    );

    let terminal = match drive(&client, &request, &mut session).await {
        Ok(Some(c)) => ProgressEvent::Completed {
            result_id: c.result_id,
            source: c.source,
        },
        Ok(None) => {
            debug!("session cancelled");
            return;
        }
        Err(e) => ProgressEvent::Failed {
            reason: e.to_string(),
        },
    };
    session.emit(terminal).await;
}

/// Runs the session up to its outcome. `Ok(None)` means cancelled.
async fn drive(
    client: &TransferClient,
    request: &UploadRequest,
    session: &mut UploadSession,
) -> Result<Option<Completion>, TrackerError> {
    let Some(upload) = client.upload.as_deref() else {
        return Err(TrackerError::TransportUnavailable);
    };

    if !session.emit(ProgressEvent::Started).await {
        return Ok(None);
    }

    let Some(job) = transfer(upload, client.credentials.as_ref(), request, session).await? else {
        return Ok(None);
    };

    if !session.emit(ProgressEvent::Accepted { job: job.clone() }).await {
        return Ok(None);
    }

    let mut racer = CompletionRacer::new(
        client.status.clone(),
        client.credentials.clone(),
        client.config.poll,
        client.push_route(),
    );
    racer.run(&job, session.cancel_token()).await.transpose()
}

/// Sends the payload, forwarding progress, and extracts the job handle.
async fn transfer(
    upload: &dyn UploadTransport,
    credentials: &dyn CredentialProvider,
    request: &UploadRequest,
    session: &mut UploadSession,
) -> Result<Option<JobHandle>, TrackerError> {
    let cancel = session.cancel_token().clone();
    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
    let mut percent = PercentTracker::new();

    let auth = credentials.authorization();
    let mut call = upload.upload(request, auth.as_deref(), tick_tx);

    let response = loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => return Ok(None),

            Some(tick) = tick_rx.recv() => {
                trace!(sent = tick.sent, total = ?tick.total, "upload progress");
                let pct = percent.advance(tick);
                if !session.emit(ProgressEvent::Progress { percent: pct }).await {
                    return Ok(None);
                }
            }

            r = &mut call => break r,
        }
    };
    drop(call);

    while let Ok(tick) = tick_rx.try_recv() {
        let pct = percent.advance(tick);
        if !session.emit(ProgressEvent::Progress { percent: pct }).await {
            return Ok(None);
        }
    }

    let body = response.map_err(TrackerError::Upload)?;
    let job = fields::job_id(&body).ok_or(TrackerError::NoJobId)?;
    info!(job = %job, "upload accepted");
    Ok(Some(job))
}
