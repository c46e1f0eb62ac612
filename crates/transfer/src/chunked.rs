use std::io;
use std::sync::Arc;

use futures_util::Stream;
use futures_util::stream;

use crate::DEFAULT_CHUNK_SIZE;
use crate::types::{ProgressSink, TransferTick};

// ---------------------------------------------------------------------------
// ChunkedPayload
// ---------------------------------------------------------------------------

/// Reads a shared payload in fixed-size chunks.
pub struct ChunkedPayload {
    data: Arc<[u8]>,
    chunk_size: usize,
    offset: usize,
}

impl ChunkedPayload {
    /// Wraps `data` for chunked reading.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub fn new(data: Arc<[u8]>, chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            data,
            chunk_size,
            offset: 0,
        }
    }

    /// Copies out the next chunk. Returns `None` once the payload is exhausted.
    pub fn next_chunk(&mut self) -> Option<Vec<u8>> {
        if self.offset >= self.data.len() {
            return None;
        }
        let end = std::cmp::min(self.offset + self.chunk_size, self.data.len());
        let chunk = self.data[self.offset..end].to_vec();
        self.offset = end;
        Some(chunk)
    }

    /// Bytes read so far.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for ChunkedPayload {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk()
    }
}

// ---------------------------------------------------------------------------
// Progress stream
// ---------------------------------------------------------------------------

/// Turns `data` into a byte stream suitable for a streaming request body.
///
/// Each chunk pulled by the transport reports the cumulative byte count on
/// `sink`. A closed sink is ignored; the upload itself is unaffected.
pub fn progress_stream(
    data: Arc<[u8]>,
    chunk_size: usize,
    sink: ProgressSink,
) -> impl Stream<Item = Result<Vec<u8>, io::Error>> + Send + 'static {
    let total = data.len() as u64;
    let mut payload = ChunkedPayload::new(data, chunk_size);

    stream::iter(std::iter::from_fn(move || {
        let chunk = payload.next_chunk()?;
        let _ = sink.send(TransferTick {
            sent: payload.offset() as u64,
            total: Some(total),
        });
        Some(Ok::<_, io::Error>(chunk))
    }))
}
