//! Collaborator traits consumed by the tracker.
//!
//! The tracker never talks to the network itself. The client crate (or a
//! test mock) implements these traits, and capabilities the environment
//! lacks are simply not injected. Keeping transport behind traits makes the
//! session logic testable without sockets.

use futures_util::future::BoxFuture;
use snaptrack_protocol::{JobHandle, UploadRequest};
use snaptrack_transfer::ProgressSink;

use crate::error::{ApiError, PushError};

/// Performs the binary upload.
pub trait UploadTransport: Send + Sync {
    /// Sends `request` and returns the parsed JSON body of a 2xx response.
    ///
    /// Progress is reported on `progress` as bytes are handed to the
    /// network. `authorization` is the header value to attach, if any.
    fn upload<'a>(
        &'a self,
        request: &'a UploadRequest,
        authorization: Option<&'a str>,
        progress: ProgressSink,
    ) -> BoxFuture<'a, Result<serde_json::Value, ApiError>>;
}

/// Performs job status requests.
pub trait StatusApi: Send + Sync {
    /// Fetches the status document for `job`.
    fn job_status<'a>(
        &'a self,
        job: &'a JobHandle,
        authorization: Option<&'a str>,
    ) -> BoxFuture<'a, Result<serde_json::Value, ApiError>>;
}

/// A frame received on a push subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushFrame {
    Text(String),
    Binary(Vec<u8>),
}

/// Opens push subscriptions.
pub trait PushTransport: Send + Sync {
    fn subscribe<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, Result<Box<dyn PushSubscription>, PushError>>;
}

/// An open push subscription.
pub trait PushSubscription: Send {
    /// Waits for the next frame. `None` means the server closed the channel.
    fn next_frame(&mut self) -> BoxFuture<'_, Option<Result<PushFrame, PushError>>>;

    /// Closes the subscription. Best-effort; errors are swallowed.
    fn close(&mut self) -> BoxFuture<'_, ()>;
}

/// Supplies the `Authorization` header value for outgoing requests.
pub trait CredentialProvider: Send + Sync {
    fn authorization(&self) -> Option<String>;
}

/// Attaches no credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn authorization(&self) -> Option<String> {
        None
    }
}
