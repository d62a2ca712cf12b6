use std::fmt;

/// Failure conditions reported by both queue variants.
///
/// Every variant is local and recoverable: the queue stays usable after any of them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Capacity reached and the caller would not (or could no longer) wait for space
    #[error("Queue is full")]
    Full,

    /// No item, or no lull-ready batch, available under the requested wait mode
    #[error("Queue is empty")]
    Empty,

    /// A negative timeout, a zero lull time, or an unbalanced `task_done`
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The lull announcer was stopped, so a blocking batch wait could never complete
    #[error("Batch queue has been shut down")]
    Shutdown,

    /// The background announcer thread could not be started
    #[error("Failed to spawn lull announcer: {0}")]
    Spawn(String),
}

/// Error returned by a failed `put`, handing the rejected item back to the caller.
#[derive(PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct PutError<T> {
    kind: QueueError,
    item: T,
}

impl<T> PutError<T> {
    pub(crate) fn full(item: T) -> Self {
        Self {
            kind: QueueError::Full,
            item,
        }
    }

    /// The condition that rejected the item
    pub fn kind(&self) -> &QueueError {
        &self.kind
    }

    /// Recover the item that was not enqueued
    pub fn into_inner(self) -> T {
        self.item
    }

    pub fn is_full(&self) -> bool {
        self.kind == QueueError::Full
    }
}

// Manual impl so `PutError<T>` is `Debug` even when `T` is not.
impl<T> fmt::Debug for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutError")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<T> From<PutError<T>> for QueueError {
    fn from(err: PutError<T>) -> Self {
        err.kind
    }
}

pub type Result<T> = std::result::Result<T, QueueError>;
