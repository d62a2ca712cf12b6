//! # Batch Queue Configuration
//!
//! Construction parameters shared by both queue variants, with defaults that
//! mirror the common "one second lull, unbounded queue" setup and environment
//! overrides for deployments that tune batching without a rebuild.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Errors raised while loading or validating a [`BatchQueueConfig`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigurationError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchQueueConfig {
    /// Name used in log events and diagnostics
    pub name: String,
    /// Inactivity required before queued items are released as a batch (milliseconds)
    pub lull_time_ms: u64,
    /// Maximum queue depth, 0 = unbounded
    pub capacity: usize,
    /// How often the blocking variant's announcer re-checks for a lull (milliseconds)
    pub tick_interval_ms: u64,
}

impl Default for BatchQueueConfig {
    fn default() -> Self {
        Self {
            name: "batch_queue".to_string(),
            lull_time_ms: 1000,
            capacity: 0,
            tick_interval_ms: 10,
        }
    }
}

impl BatchQueueConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_lull_time_ms(mut self, lull_time_ms: u64) -> Self {
        self.lull_time_ms = lull_time_ms;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_tick_interval_ms(mut self, tick_interval_ms: u64) -> Self {
        self.tick_interval_ms = tick_interval_ms;
        self
    }

    pub fn lull_time(&self) -> Duration {
        Duration::from_millis(self.lull_time_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Load defaults, then apply any `BATCHQUEUE_*` environment overrides
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("BATCHQUEUE_NAME") {
            config.name = name;
        }

        if let Ok(lull_time) = std::env::var("BATCHQUEUE_LULL_TIME_MS") {
            config.lull_time_ms = lull_time.parse().map_err(|e| {
                ConfigurationError::invalid("lull_time_ms", format!("{e}"))
            })?;
        }

        if let Ok(capacity) = std::env::var("BATCHQUEUE_CAPACITY") {
            config.capacity = capacity
                .parse()
                .map_err(|e| ConfigurationError::invalid("capacity", format!("{e}")))?;
        }

        if let Ok(tick) = std::env::var("BATCHQUEUE_TICK_INTERVAL_MS") {
            config.tick_interval_ms = tick.parse().map_err(|e| {
                ConfigurationError::invalid("tick_interval_ms", format!("{e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.lull_time_ms == 0 {
            return Err(ConfigurationError::invalid(
                "lull_time_ms",
                "must be greater than zero",
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigurationError::invalid(
                "tick_interval_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}
