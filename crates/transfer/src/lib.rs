//! Payload streaming with progress tracking.
//!
//! Splits an in-memory payload into chunks, reports every chunk handed to
//! the transport as a [`TransferTick`], and turns ticks into a monotonic
//! upload percentage.

mod chunked;
mod progress;
mod types;

pub use chunked::{ChunkedPayload, progress_stream};
pub use progress::{PercentTracker, percent_of};
pub use types::{ProgressSink, TransferTick};

/// Default chunk size: 64 KiB.
///
/// Small enough that progress ticks stay frequent on typical image sizes.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
