//! # System Constants
//!
//! Defaults and operation names that bound the bundling pipeline.

/// Default values used when configuration leaves a field unset
pub mod defaults {
    /// Seconds to wait for the path planner before declaring it stuck
    pub const PATH_PLAN_TIMEOUT_SECONDS: f64 = 10.0;
    /// Longest accepted planner timeout (one day)
    pub const MAX_PATH_PLAN_TIMEOUT_SECONDS: f64 = 86_400.0;
    /// Trailing committed tasks that take part in the permutations
    pub const PERMUTE_LAST_COMMITTED: usize = 1;
    /// Maximum number of queued bundling requests
    pub const QUEUE_CAPACITY: usize = 100;
    /// Idle wait between healthy heartbeats while the queue is empty
    pub const IDLE_HEARTBEAT_MS: u64 = 1000;
    /// Queue depth above which a backlog warning is reported
    pub const BACKLOG_WARNING_THRESHOLD: usize = 1;
    /// Sweep unread result caches every N consumed requests
    pub const CLEANUP_EVERY_REQUESTS: u64 = 100;
    /// Pause after a recoverable planning failure
    pub const RECOVERY_PAUSE_MS: u64 = 1000;
    /// Topic name results are broadcast on
    pub const RESULT_TOPIC: &str = "GoalEvaluator";
    /// Buffered results per broadcast subscriber
    pub const BROADCAST_CAPACITY: usize = 1000;
    /// Planner backlog above which a busy warning is logged
    pub const PLANNER_BUSY_THRESHOLD: usize = 1;
}

/// Operation names used in structured log records
pub mod operations {
    pub const REQUEST_RECEIVED: &str = "request.received";
    pub const REQUEST_COMPLETED: &str = "request.completed";
    pub const REQUEST_FAILED: &str = "request.failed";
    pub const RESULT_DELIVERED: &str = "result.delivered";
    pub const CACHE_SWEPT: &str = "cache.swept";
}
