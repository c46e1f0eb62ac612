use std::time::Duration;

use snaptrack_protocol::constants::POLL_INTERVAL;

/// Default capacity of a session's event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// How the poller paces and bounds its status checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Give up after this many checks. `None` polls until ready or cancelled.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

/// Session configuration shared by every upload of a [`TransferClient`].
///
/// [`TransferClient`]: crate::TransferClient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Base address of the push channel. `None` forces poll-only mode.
    pub push_base: Option<String>,
    pub poll: PollPolicy,
    pub event_buffer: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            push_base: None,
            poll: PollPolicy::default(),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl TrackerConfig {
    /// Returns the push base if one is set and non-blank.
    pub fn push_base(&self) -> Option<&str> {
        self.push_base
            .as_deref()
            .map(str::trim)
            .filter(|base| !base.is_empty())
    }
}
