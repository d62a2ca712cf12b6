//! # Blocking Batch Queue
//!
//! Thread-safe batch queue. Producers and consumers share one mutex; each wait
//! condition has its own condition variable, so a consumer parked on
//! `get_batch` never blocks unrelated `put`/`get` traffic.
//!
//! Batch readiness is level-triggered: a consumer proceeds only while the queue
//! is non-empty *and* no `put` has landed for `lull_time`. A `put` that arrives
//! after the announcer signalled simply makes the condition false again, and
//! the consumer goes back to sleep until a fresh full lull has passed.

use super::announcer::Announcer;
use super::stats::BatchQueueStats;
use super::wait::Wait;
use crate::config::BatchQueueConfig;
use crate::error::{PutError, QueueError, Result};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

struct State<T> {
    items: VecDeque<T>,
    /// Time of the last successful `put` (or batch drain)
    modified: Instant,
    unfinished_tasks: usize,
    batch_count: usize,
    batches_delivered: u64,
    items_delivered: u64,
    /// False once the announcer has been stopped
    announcing: bool,
}

impl<T> State<T> {
    fn has_ready_batch(&self, now: Instant, lull_time: Duration) -> bool {
        !self.items.is_empty() && now.saturating_duration_since(self.modified) >= lull_time
    }
}

/// State shared between the queue handle and its announcer thread
pub(crate) struct Shared<T> {
    name: String,
    lull_time: Duration,
    capacity: usize,
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    batch_ready: Condvar,
    all_tasks_done: Condvar,
}

impl<T> Shared<T> {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    fn is_full(&self, state: &State<T>) -> bool {
        self.capacity > 0 && state.items.len() >= self.capacity
    }

    /// One announcer tick: wake batch consumers if a lull has been reached
    pub(crate) fn announce(&self) {
        let mut state = self.state.lock();
        if state.has_ready_batch(Instant::now(), self.lull_time) {
            state.batch_count = state.items.len();
            self.batch_ready.notify_all();
        }
    }
}

/// Park on `condvar` until `ready` holds for the state.
///
/// Returns false when the wait mode gives up first.
fn wait_until_ready<T>(
    condvar: &Condvar,
    state: &mut MutexGuard<'_, State<T>>,
    wait: Wait,
    deadline: Option<Instant>,
    ready: impl Fn(&State<T>) -> bool,
) -> bool {
    loop {
        if ready(&**state) {
            return true;
        }
        match (wait, deadline) {
            (Wait::NoWait, _) => return false,
            (_, None) => condvar.wait(state),
            (_, Some(deadline)) => {
                if Instant::now() >= deadline {
                    return false;
                }
                condvar.wait_until(state, deadline);
            }
        }
    }
}

/// A FIFO queue for threads that hands out everything queued once a lull is reached.
///
/// Share it between producers and consumers behind an [`Arc`]. Dropping the last
/// handle stops the announcer thread.
///
/// ```rust,no_run
/// use batchqueue::{BatchQueue, Wait};
/// use std::sync::Arc;
/// use std::thread;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Release a batch whenever producers go quiet for 700ms
/// let queue = Arc::new(BatchQueue::with_lull_time(700)?);
///
/// let consumer = Arc::clone(&queue);
/// thread::spawn(move || loop {
///     let Ok(batch) = consumer.get_batch(Wait::Block) else { break };
///     for _ in &batch {
///         let _ = consumer.task_done();
///     }
/// });
///
/// for event in 1..=10 {
///     queue.put(event, Wait::Block)?;
/// }
/// queue.join();
/// # Ok(())
/// # }
/// ```
pub struct BatchQueue<T> {
    shared: Arc<Shared<T>>,
    announcer: Mutex<Option<Announcer>>,
}

impl<T: Send + 'static> BatchQueue<T> {
    /// Create a queue and start its lull announcer
    pub fn new(config: BatchQueueConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| QueueError::InvalidArgument(e.to_string()))?;

        let shared = Arc::new(Shared {
            name: config.name.clone(),
            lull_time: config.lull_time(),
            capacity: config.capacity,
            state: Mutex::new(State {
                items: VecDeque::new(),
                modified: Instant::now(),
                unfinished_tasks: 0,
                batch_count: 0,
                batches_delivered: 0,
                items_delivered: 0,
                announcing: true,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            batch_ready: Condvar::new(),
            all_tasks_done: Condvar::new(),
        });

        let announcer = Announcer::spawn(Arc::clone(&shared), config.tick_interval())?;

        info!(
            queue = %config.name,
            lull_time_ms = config.lull_time_ms,
            capacity = config.capacity,
            tick_interval_ms = config.tick_interval_ms,
            "🧺 Batch queue initialized"
        );

        Ok(Self {
            shared,
            announcer: Mutex::new(Some(announcer)),
        })
    }

    /// Unbounded queue with the given lull time in milliseconds
    pub fn with_lull_time(lull_time_ms: u64) -> Result<Self> {
        Self::new(BatchQueueConfig::default().with_lull_time_ms(lull_time_ms))
    }
}

impl<T> BatchQueue<T> {
    /// Insert an item, waiting for space according to `wait`.
    ///
    /// A successful put restarts the lull clock. On failure the item is handed back.
    pub fn put(&self, item: T, wait: Wait) -> std::result::Result<(), PutError<T>> {
        let shared = &*self.shared;
        let deadline = wait.deadline(Instant::now());
        let mut state = shared.state.lock();

        if !wait_until_ready(&shared.not_full, &mut state, wait, deadline, |s| {
            !shared.is_full(s)
        }) {
            return Err(PutError::full(item));
        }

        state.items.push_back(item);
        state.modified = Instant::now();
        state.unfinished_tasks += 1;
        shared.not_empty.notify_one();

        trace!(queue = %shared.name, len = state.items.len(), "Lull clock reset by put");
        Ok(())
    }

    pub fn try_put(&self, item: T) -> std::result::Result<(), PutError<T>> {
        self.put(item, Wait::NoWait)
    }

    /// Remove and return the oldest item, waiting for one according to `wait`.
    ///
    /// Does not touch the lull clock.
    pub fn get(&self, wait: Wait) -> Result<T> {
        let shared = &*self.shared;
        let deadline = wait.deadline(Instant::now());
        let mut state = shared.state.lock();

        if !wait_until_ready(&shared.not_empty, &mut state, wait, deadline, |s| {
            !s.items.is_empty()
        }) {
            return Err(QueueError::Empty);
        }

        let item = state.items.pop_front().ok_or(QueueError::Empty)?;
        state.batch_count = state.batch_count.saturating_sub(1);
        shared.not_full.notify_one();
        Ok(item)
    }

    pub fn try_get(&self) -> Result<T> {
        self.get(Wait::NoWait)
    }

    /// Wait for a lull, then remove and return everything queued as one batch.
    ///
    /// [`Wait::NoWait`] returns a batch only if one is ready right now, and fails
    /// with [`QueueError::Empty`] on an empty queue without looking at the clock.
    /// A blocking wait on a queue whose announcer was shut down fails with
    /// [`QueueError::Shutdown`].
    pub fn get_batch(&self, wait: Wait) -> Result<Vec<T>> {
        let shared = &*self.shared;
        let deadline = wait.deadline(Instant::now());
        let mut state = shared.state.lock();

        loop {
            if state.has_ready_batch(Instant::now(), shared.lull_time) {
                break;
            }
            if !wait.is_blocking() {
                return Err(QueueError::Empty);
            }
            if !state.announcing {
                return Err(QueueError::Shutdown);
            }
            match deadline {
                None => shared.batch_ready.wait(&mut state),
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Err(QueueError::Empty);
                    }
                    shared.batch_ready.wait_until(&mut state, deadline);
                }
            }
        }

        let batch: Vec<T> = state.items.drain(..).collect();
        state.modified = Instant::now();
        state.batch_count = 0;
        state.batches_delivered += 1;
        state.items_delivered += batch.len() as u64;
        shared.not_full.notify_all();

        debug!(
            queue = %shared.name,
            batch_size = batch.len(),
            batches_delivered = state.batches_delivered,
            "📦 Batch released after lull"
        );
        Ok(batch)
    }

    /// Items still inside their lull count as no batch: this fails with [`QueueError::Empty`].
    pub fn try_get_batch(&self) -> Result<Vec<T>> {
        self.get_batch(Wait::NoWait)
    }

    /// Acknowledge that one retrieved item has been processed
    pub fn task_done(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.unfinished_tasks == 0 {
            return Err(QueueError::InvalidArgument(
                "task_done() called too many times".to_string(),
            ));
        }
        state.unfinished_tasks -= 1;
        if state.unfinished_tasks == 0 {
            self.shared.all_tasks_done.notify_all();
        }
        Ok(())
    }

    /// Block until every item put has been acknowledged with [`task_done`](Self::task_done)
    pub fn join(&self) {
        let mut state = self.shared.state.lock();
        while state.unfinished_tasks > 0 {
            self.shared.all_tasks_done.wait(&mut state);
        }
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        let state = self.shared.state.lock();
        self.shared.is_full(&state)
    }

    pub fn capacity(&self) -> Option<usize> {
        (self.shared.capacity > 0).then_some(self.shared.capacity)
    }

    pub fn lull_time(&self) -> Duration {
        self.shared.lull_time
    }

    pub fn stats(&self) -> BatchQueueStats {
        let state = self.shared.state.lock();
        BatchQueueStats {
            name: self.shared.name.clone(),
            len: state.items.len(),
            capacity: self.shared.capacity,
            unfinished_tasks: state.unfinished_tasks,
            batch_count: state.batch_count,
            batches_delivered: state.batches_delivered,
            items_delivered: state.items_delivered,
        }
    }

    /// Stop the announcer thread. Idempotent.
    ///
    /// Non-blocking operations keep working afterwards; blocked and future
    /// blocking `get_batch` calls fail with [`QueueError::Shutdown`].
    pub fn shutdown(&self) {
        let Some(announcer) = self.announcer.lock().take() else {
            return;
        };

        self.shared.state.lock().announcing = false;
        self.shared.batch_ready.notify_all();
        announcer.stop();

        info!(queue = %self.shared.name, "🛑 Batch queue announcer stopped");
    }
}

impl<T> Drop for BatchQueue<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<T> fmt::Debug for BatchQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchQueue")
            .field("name", &self.shared.name)
            .field("lull_time", &self.shared.lull_time)
            .field("capacity", &self.shared.capacity)
            .field("len", &self.len())
            .finish()
    }
}
