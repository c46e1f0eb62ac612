//! Network collaborators for snaptrack upload sessions.
//!
//! Implements the tracker's transport traits on top of `reqwest` and
//! `tokio-tungstenite`, plus file-backed credentials.

pub mod credentials;
pub mod error;
pub mod http;
pub mod ws;

pub use credentials::{AUTH_TOKEN_KEY, CredentialError, StaticToken, TokenStore};
pub use error::ClientError;
pub use http::HttpApi;
pub use ws::WsPushTransport;
