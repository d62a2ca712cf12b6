//! # Lull-Triggered Batch Queues
//!
//! FIFO queues that hold items until insertions go quiet for `lull_time`, then
//! hand everything queued to a consumer in one batch.
//!
//! ## Variants
//!
//! - [`BatchQueue`]: for threads. A background announcer thread watches the
//!   time of the last `put` and wakes batch consumers once a lull is reached.
//! - [`AsyncBatchQueue`]: for tokio tasks. Every `put` cancels and replaces a
//!   delayed lull task; consumers suspend on it and retry transparently when
//!   it is reset.
//!
//! Both variants share the same lifecycle:
//!
//! ```text
//! Quiet(since) --put--> Quiet(since = now)
//! Quiet(since) --lull_time elapses, queue non-empty--> Ready
//! Ready --get_batch drains--> Quiet(since = now)
//! ```

mod announcer;
pub mod blocking;
pub mod cooperative;
mod lull;
pub mod stats;
pub mod wait;

pub use blocking::BatchQueue;
pub use cooperative::AsyncBatchQueue;
pub use stats::BatchQueueStats;
pub use wait::Wait;
