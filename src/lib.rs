#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # batchqueue
//!
//! Queues that coalesce bursts of work: items put in quick succession are held
//! back and released to a consumer as a single batch once insertions have gone
//! quiet for a configurable `lull_time`.
//!
//! ## Overview
//!
//! Producers `put` items as they arrive. Each successful `put` restarts the lull
//! clock. A consumer calling `get_batch` stays parked until the clock runs out
//! with at least one item queued, then receives everything queued, in insertion
//! order, in one `Vec`. Plain single-item `get` keeps working alongside.
//!
//! ## Module Organization
//!
//! - [`queue`] - [`BatchQueue`] for threads and [`AsyncBatchQueue`] for tokio tasks
//! - [`config`] - Construction parameters and environment overrides
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use batchqueue::{BatchQueue, BatchQueueConfig, Wait};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = BatchQueue::new(BatchQueueConfig::default().with_lull_time_ms(700))?;
//!
//! queue.put("first", Wait::Block)?;
//! queue.put("second", Wait::Block)?;
//!
//! // Returns ~700ms after the second put
//! let batch = queue.get_batch(Wait::Block)?;
//! assert_eq!(batch, vec!["first", "second"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod queue;

pub use config::{BatchQueueConfig, ConfigurationError};
pub use error::{PutError, QueueError, Result};
pub use queue::{AsyncBatchQueue, BatchQueue, BatchQueueStats, Wait};
