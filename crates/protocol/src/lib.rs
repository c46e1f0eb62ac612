//! Wire constants and data model shared by the snaptrack crates.
//!
//! Covers the upload, status and push endpoint shapes, the progress event
//! model, and the tolerant field lookups used on server responses.

pub mod constants;
pub mod fields;
pub mod paths;
pub mod types;

// Re-export primary types for convenience.
pub use fields::PollStatus;
pub use types::{CompletionSource, JobHandle, ProgressEvent, ResultId, UploadRequest};
