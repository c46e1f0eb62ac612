use snaptrack_protocol::constants::{UNKNOWN_TOTAL_BYTES_PER_PERCENT, UNKNOWN_TOTAL_CAP};

use crate::types::TransferTick;

/// Converts a tick into a percentage in `0..=100`.
///
/// With a known total this is `round(100 * sent / total)`. Without one the
/// value is estimated from the byte count and capped at
/// [`UNKNOWN_TOTAL_CAP`], so an unknown-size upload never reports 100.
pub fn percent_of(tick: TransferTick) -> u8 {
    match tick.total {
        Some(total) if total > 0 => {
            let pct = (tick.sent as f64 * 100.0 / total as f64).round();
            pct.clamp(0.0, 100.0) as u8
        }
        _ => {
            let estimate =
                (tick.sent as f64 / UNKNOWN_TOTAL_BYTES_PER_PERCENT as f64).round() as u64;
            estimate.min(UNKNOWN_TOTAL_CAP as u64) as u8
        }
    }
}

/// Keeps the reported percentage non-decreasing.
///
/// Transports may report out-of-order or regressing ticks (retries, a
/// total that becomes known late); the tracker never goes backwards.
#[derive(Debug, Default)]
pub struct PercentTracker {
    last: u8,
}

impl PercentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a tick in and returns the percentage to report.
    pub fn advance(&mut self, tick: TransferTick) -> u8 {
        self.last = self.last.max(percent_of(tick));
        self.last
    }
}
