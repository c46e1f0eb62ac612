//! Upload sessions with push/poll completion tracking.
//!
//! [`TransferClient`] uploads an asset and returns a [`ProgressStream`] of
//! [`ProgressEvent`]s. Once the server accepts the upload, a
//! [`CompletionRacer`] runs the [`Poller`] and, when configured, the
//! [`PushListener`] side by side; whichever reports the result first ends
//! the session.
//!
//! The crate never touches the network. Transports are injected as
//! [`UploadTransport`], [`StatusApi`] and [`PushTransport`] implementations.
//!
//! [`ProgressEvent`]: snaptrack_protocol::ProgressEvent

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod push;
pub mod racer;
mod session;
pub mod stream;

#[cfg(test)]
mod mock;

pub use api::{
    CredentialProvider, NoCredentials, PushFrame, PushSubscription, PushTransport, StatusApi,
    UploadTransport,
};
pub use client::TransferClient;
pub use config::{PollPolicy, TrackerConfig};
pub use error::{ApiError, PushError, TrackerError};
pub use poller::Poller;
pub use push::PushListener;
pub use racer::{Completion, CompletionRacer, PushRoute, RaceOutcome, RaceState};
pub use stream::ProgressStream;
