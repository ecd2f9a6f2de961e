//! # Bundler Configuration
//!
//! Layered configuration for the bundling pipeline: built-in defaults, an optional
//! TOML file, then `BUNDLER__`-prefixed environment variables. Every field has a
//! default so an empty file (or no file at all) yields a working configuration.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bundler_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let timeout = manager.config().planner.path_plan_timeout();
//! let capacity = manager.config().queue.capacity;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::defaults;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring `config/bundler.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BundlerConfig {
    /// Path-planner interaction
    pub planner: PlannerConfig,

    /// Bundle search tuning
    pub search: SearchConfig,

    /// Incoming request queue
    pub queue: QueueConfig,

    /// Worker loop cadence
    pub worker: WorkerConfig,

    /// Result broadcast channel
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// If the planner takes longer than this to answer, assume it is stuck.
    pub path_plan_timeout_seconds: f64,
    /// Send a throw-away job before the first real search of a session.
    pub warm_up: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            path_plan_timeout_seconds: defaults::PATH_PLAN_TIMEOUT_SECONDS,
            warm_up: true,
        }
    }
}

impl PlannerConfig {
    /// Falls back to the default for values `validate()` rejects.
    pub fn path_plan_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.path_plan_timeout_seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(defaults::PATH_PLAN_TIMEOUT_SECONDS))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// How many tasks at the end of the committed list take part in the permutations
    pub permute_last_committed: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            permute_last_committed: defaults::PERMUTE_LAST_COMMITTED,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    pub capacity: usize,
    /// Longest idle wait before the worker re-signals healthy
    pub idle_heartbeat_ms: u64,
    /// Queue depth above which the worker reports a backlog warning
    pub backlog_warning_threshold: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::QUEUE_CAPACITY,
            idle_heartbeat_ms: defaults::IDLE_HEARTBEAT_MS,
            backlog_warning_threshold: defaults::BACKLOG_WARNING_THRESHOLD,
        }
    }
}

impl QueueConfig {
    pub fn idle_heartbeat(&self) -> Duration {
        Duration::from_millis(self.idle_heartbeat_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Sweep unread result caches every N consumed requests
    pub cleanup_every_requests: u64,
    /// Pause after a recoverable failure before taking the next request
    pub recovery_pause_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cleanup_every_requests: defaults::CLEANUP_EVERY_REQUESTS,
            recovery_pause_ms: defaults::RECOVERY_PAUSE_MS,
        }
    }
}

impl WorkerConfig {
    pub fn recovery_pause(&self) -> Duration {
        Duration::from_millis(self.recovery_pause_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    pub topic: String,
    pub broadcast_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            topic: defaults::RESULT_TOPIC.to_string(),
            broadcast_capacity: defaults::BROADCAST_CAPACITY,
        }
    }
}

impl BundlerConfig {
    /// Validate configuration values that would otherwise fail deep inside the pipeline
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let timeout = self.planner.path_plan_timeout_seconds;
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(ConfigurationError::invalid_value(
                "planner.path_plan_timeout_seconds",
                timeout.to_string(),
                "timeout must be a positive number of seconds",
            ));
        }
        if timeout > defaults::MAX_PATH_PLAN_TIMEOUT_SECONDS {
            return Err(ConfigurationError::invalid_value(
                "planner.path_plan_timeout_seconds",
                timeout.to_string(),
                format!(
                    "timeout must not exceed {} seconds",
                    defaults::MAX_PATH_PLAN_TIMEOUT_SECONDS
                ),
            ));
        }

        if self.queue.capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "queue.capacity",
                "0",
                "queue capacity must be greater than 0",
            ));
        }

        if self.queue.idle_heartbeat_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "queue.idle_heartbeat_ms",
                "0",
                "heartbeat interval must be greater than 0",
            ));
        }

        if self.worker.cleanup_every_requests == 0 {
            return Err(ConfigurationError::invalid_value(
                "worker.cleanup_every_requests",
                "0",
                "cleanup cadence must be greater than 0",
            ));
        }

        if self.events.broadcast_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.broadcast_capacity",
                "0",
                "broadcast capacity must be greater than 0",
            ));
        }

        Ok(())
    }
}
