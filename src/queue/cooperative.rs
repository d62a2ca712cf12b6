//! # Cooperative Batch Queue
//!
//! Async batch queue for tokio tasks. Lull detection is a cancellable delayed
//! task: each `put` replaces it, and a consumer suspended in `get_batch` treats
//! the replacement as a signal to wait again rather than as a failure.
//!
//! State is guarded by a `parking_lot` mutex that is never held across an
//! `.await`; suspension happens on [`Notify`] (space, items, task completion)
//! or on the lull watch channel. Waiters on `Notify` resume in FIFO order.

use super::lull::{self, LullOutcome, LullTimer};
use super::stats::BatchQueueStats;
use super::wait::Wait;
use crate::config::BatchQueueConfig;
use crate::error::{PutError, QueueError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tokio::time::{self, Instant};
use tracing::{debug, info, trace};

struct State<T> {
    items: VecDeque<T>,
    lull: LullTimer,
    unfinished_tasks: usize,
    batches_delivered: u64,
    items_delivered: u64,
}

/// Await a notification; false when the wait mode gives up first
async fn suspend(notified: Pin<&mut Notified<'_>>, wait: Wait, deadline: Option<Instant>) -> bool {
    match (wait, deadline) {
        (Wait::NoWait, _) => false,
        (_, None) => {
            notified.await;
            true
        }
        (_, Some(deadline)) => time::timeout_at(deadline, notified).await.is_ok(),
    }
}

/// A FIFO queue for async tasks that hands out everything queued once a lull is reached.
///
/// ```rust,no_run
/// use batchqueue::{AsyncBatchQueue, Wait};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let queue = Arc::new(AsyncBatchQueue::with_lull_time(700)?);
///
/// let consumer = Arc::clone(&queue);
/// tokio::spawn(async move {
///     while let Ok(batch) = consumer.get_batch(Wait::Block).await {
///         for _ in &batch {
///             let _ = consumer.task_done();
///         }
///     }
/// });
///
/// for event in 1..=10 {
///     queue.put(event, Wait::Block).await?;
/// }
/// queue.join().await;
/// # Ok(())
/// # }
/// ```
pub struct AsyncBatchQueue<T> {
    name: String,
    lull_time: Duration,
    capacity: usize,
    state: Mutex<State<T>>,
    not_empty: Notify,
    not_full: Notify,
    all_tasks_done: Notify,
}

impl<T> AsyncBatchQueue<T> {
    pub fn new(config: BatchQueueConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| QueueError::InvalidArgument(e.to_string()))?;

        info!(
            queue = %config.name,
            lull_time_ms = config.lull_time_ms,
            capacity = config.capacity,
            "🧺 Async batch queue initialized"
        );

        Ok(Self {
            name: config.name.clone(),
            lull_time: config.lull_time(),
            capacity: config.capacity,
            state: Mutex::new(State {
                items: VecDeque::new(),
                lull: LullTimer::new(config.lull_time()),
                unfinished_tasks: 0,
                batches_delivered: 0,
                items_delivered: 0,
            }),
            not_empty: Notify::new(),
            not_full: Notify::new(),
            all_tasks_done: Notify::new(),
        })
    }

    /// Unbounded queue with the given lull time in milliseconds
    pub fn with_lull_time(lull_time_ms: u64) -> Result<Self> {
        Self::new(BatchQueueConfig::default().with_lull_time_ms(lull_time_ms))
    }

    fn is_full_locked(&self, state: &State<T>) -> bool {
        self.capacity > 0 && state.items.len() >= self.capacity
    }

    /// Insert an item, suspending for space according to `wait`.
    ///
    /// On success the lull task is cancelled and rescheduled before this returns,
    /// so no consumer can observe the old lull expiring. On failure the item is
    /// handed back.
    pub async fn put(&self, item: T, wait: Wait) -> std::result::Result<(), PutError<T>> {
        let deadline = wait.deadline(Instant::now());

        loop {
            let notified = self.not_full.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if !self.is_full_locked(&state) {
                    state.items.push_back(item);
                    state.unfinished_tasks += 1;
                    state.lull.reschedule();
                    trace!(
                        queue = %self.name,
                        len = state.items.len(),
                        generation = state.lull.generation(),
                        "Lull task rescheduled by put"
                    );
                    drop(state);
                    self.not_empty.notify_one();
                    return Ok(());
                }
            }

            if !suspend(notified, wait, deadline).await {
                return Err(PutError::full(item));
            }
        }
    }

    pub async fn try_put(&self, item: T) -> std::result::Result<(), PutError<T>> {
        self.put(item, Wait::NoWait).await
    }

    /// Remove and return the oldest item, suspending for one according to `wait`.
    pub async fn get(&self, wait: Wait) -> Result<T> {
        let deadline = wait.deadline(Instant::now());

        loop {
            let notified = self.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let item = self.state.lock().items.pop_front();

            if let Some(item) = item {
                self.not_full.notify_one();
                return Ok(item);
            }

            if !suspend(notified, wait, deadline).await {
                return Err(QueueError::Empty);
            }
        }
    }

    pub async fn try_get(&self) -> Result<T> {
        self.get(Wait::NoWait).await
    }

    /// Suspend until a full lull has passed, then remove and return everything queued.
    ///
    /// A `put` that lands while we are suspended restarts the wait on the new lull
    /// task; it is never reported as an error. [`Wait::NoWait`] returns a batch only
    /// if one is ready right now.
    pub async fn get_batch(&self, wait: Wait) -> Result<Vec<T>> {
        let deadline = wait.deadline(Instant::now());

        loop {
            let (mut rx, seen) = {
                let mut state = self.state.lock();
                let mut rx = state.lull.subscribe();
                let seen = *rx.borrow_and_update();

                if seen.expired && !state.items.is_empty() {
                    let batch = self.drain(&mut state);
                    drop(state);
                    self.not_full.notify_waiters();
                    return Ok(batch);
                }
                if !wait.is_blocking() {
                    return Err(QueueError::Empty);
                }
                (rx, seen)
            };

            match lull::wait_for_change(&mut rx, seen, deadline).await {
                LullOutcome::Expired => {}
                LullOutcome::Reset => {
                    trace!(queue = %self.name, "Lull task reset while waiting for a batch");
                }
                LullOutcome::TimedOut => return Err(QueueError::Empty),
            }
        }
    }

    /// Items still inside their lull count as no batch: this fails with [`QueueError::Empty`].
    pub async fn try_get_batch(&self) -> Result<Vec<T>> {
        self.get_batch(Wait::NoWait).await
    }

    fn drain(&self, state: &mut State<T>) -> Vec<T> {
        let batch: Vec<T> = state.items.drain(..).collect();
        state.batches_delivered += 1;
        state.items_delivered += batch.len() as u64;

        debug!(
            queue = %self.name,
            batch_size = batch.len(),
            batches_delivered = state.batches_delivered,
            "📦 Batch released after lull"
        );
        batch
    }

    /// Acknowledge that one retrieved item has been processed
    pub fn task_done(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.unfinished_tasks == 0 {
            return Err(QueueError::InvalidArgument(
                "task_done() called too many times".to_string(),
            ));
        }
        state.unfinished_tasks -= 1;
        if state.unfinished_tasks == 0 {
            self.all_tasks_done.notify_waiters();
        }
        Ok(())
    }

    /// Suspend until every item put has been acknowledged with [`task_done`](Self::task_done)
    pub async fn join(&self) {
        loop {
            let notified = self.all_tasks_done.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let done = self.state.lock().unfinished_tasks == 0;
            if done {
                return;
            }
            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        let state = self.state.lock();
        self.is_full_locked(&state)
    }

    pub fn capacity(&self) -> Option<usize> {
        (self.capacity > 0).then_some(self.capacity)
    }

    pub fn lull_time(&self) -> Duration {
        self.lull_time
    }

    pub fn stats(&self) -> BatchQueueStats {
        let state = self.state.lock();
        // Depth of the batch a consumer would receive right now
        let batch_count = if state.lull.is_expired() {
            state.items.len()
        } else {
            0
        };
        BatchQueueStats {
            name: self.name.clone(),
            len: state.items.len(),
            capacity: self.capacity,
            unfinished_tasks: state.unfinished_tasks,
            batch_count,
            batches_delivered: state.batches_delivered,
            items_delivered: state.items_delivered,
        }
    }
}

impl<T> fmt::Debug for AsyncBatchQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncBatchQueue")
            .field("name", &self.name)
            .field("lull_time", &self.lull_time)
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}
