#![allow(dead_code)]

pub mod strategies;

use batchqueue::{logging, BatchQueueConfig};

/// Logging is opt-in for test runs via `RUST_LOG`
pub fn init_test_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        logging::init_structured_logging();
    }
}

pub fn test_config(lull_time_ms: u64) -> BatchQueueConfig {
    BatchQueueConfig::default()
        .with_name("integration")
        .with_lull_time_ms(lull_time_ms)
        .with_tick_interval_ms(2)
}

/// Paused-clock runtime for deterministic lull timing outside `#[tokio::test]`
pub fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("failed to build paused runtime")
}
