use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of a batch queue, for diagnostics and logging
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchQueueStats {
    pub name: String,
    /// Items currently queued
    pub len: usize,
    /// Maximum depth, 0 = unbounded
    pub capacity: usize,
    /// Items put but not yet acknowledged with `task_done`
    pub unfinished_tasks: usize,
    /// Queue depth when a lull was last recognized, reduced by single-item `get`s.
    /// Diagnostic only; nothing gates on it.
    pub batch_count: usize,
    pub batches_delivered: u64,
    pub items_delivered: u64,
}

impl BatchQueueStats {
    /// Average number of items per delivered batch
    pub fn average_batch_size(&self) -> f64 {
        if self.batches_delivered == 0 {
            return 0.0;
        }
        self.items_delivered as f64 / self.batches_delivered as f64
    }
}
