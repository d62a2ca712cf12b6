//! How long a queue operation may wait before giving up.

use crate::error::{QueueError, Result};
use std::time::Duration;

/// Blocking mode for `put`, `get` and `get_batch`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Wait {
    /// Wait for as long as it takes
    #[default]
    Block,
    /// Wait at most this long, then fail
    Timeout(Duration),
    /// Fail immediately if the operation cannot complete right now
    NoWait,
}

impl Wait {
    /// Bounded wait from a number of seconds; negative or non-finite values are rejected
    pub fn from_secs_f64(secs: f64) -> Result<Self> {
        if secs < 0.0 {
            return Err(QueueError::InvalidArgument(format!(
                "'timeout' must be a non-negative number, got {secs}"
            )));
        }
        Duration::try_from_secs_f64(secs)
            .map(Wait::Timeout)
            .map_err(|e| QueueError::InvalidArgument(format!("invalid 'timeout' {secs}: {e}")))
    }

    /// Build a wait mode from the classic `block` / `timeout` pair.
    ///
    /// When `block` is false the timeout is ignored.
    pub fn from_options(block: bool, timeout_secs: Option<f64>) -> Result<Self> {
        match (block, timeout_secs) {
            (false, _) => Ok(Wait::NoWait),
            (true, None) => Ok(Wait::Block),
            (true, Some(secs)) => Self::from_secs_f64(secs),
        }
    }

    pub fn is_blocking(&self) -> bool {
        !matches!(self, Wait::NoWait)
    }

    /// Absolute deadline for a bounded wait that starts at `now`.
    ///
    /// A timeout too large to represent as an instant waits like [`Wait::Block`].
    pub(crate) fn deadline<I: Deadline>(&self, now: I) -> Option<I> {
        match self {
            Wait::Timeout(timeout) => now.checked_after(*timeout),
            Wait::Block | Wait::NoWait => None,
        }
    }
}

/// Clock instants a bounded wait can be measured against
pub(crate) trait Deadline: Sized {
    fn checked_after(self, timeout: Duration) -> Option<Self>;
}

impl Deadline for std::time::Instant {
    fn checked_after(self, timeout: Duration) -> Option<Self> {
        self.checked_add(timeout)
    }
}

impl Deadline for tokio::time::Instant {
    fn checked_after(self, timeout: Duration) -> Option<Self> {
        self.checked_add(timeout)
    }
}
