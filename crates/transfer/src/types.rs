use tokio::sync::mpsc;

/// Bytes handed to the transport so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferTick {
    pub sent: u64,
    /// Total payload size, when the transport knows it.
    pub total: Option<u64>,
}

/// Channel on which a transport reports [`TransferTick`]s.
///
/// Unbounded so the transport never waits on the observer.
pub type ProgressSink = mpsc::UnboundedSender<TransferTick>;
