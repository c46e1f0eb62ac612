//! Tracker error types.

use snaptrack_protocol::constants::{REASON_NO_JOB_ID, REASON_TRANSPORT_UNAVAILABLE};

/// Fatal session errors. The `Display` text becomes the `Failed` reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("{}", REASON_TRANSPORT_UNAVAILABLE)]
    TransportUnavailable,

    #[error("upload failed: {0}")]
    Upload(ApiError),

    #[error("{}", REASON_NO_JOB_ID)]
    NoJobId,

    #[error("job did not complete after {attempts} status checks")]
    PollExhausted { attempts: u32 },

    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure of a single API request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(String),

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Failure of the push channel. Never fatal to a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PushError {
    #[error("push connect failed: {0}")]
    Connect(String),

    #[error("push transport error: {0}")]
    Transport(String),

    #[error("push channel closed")]
    Closed,
}
