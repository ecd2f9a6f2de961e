//! # Bundling Pipeline
//!
//! Everything between an incoming [`BundlingRequest`](crate::models::BundlingRequest)
//! and its published result:
//!
//! - **BundlingQueue**: bounded FIFO shared by any number of producers
//! - **BundlingWorker**: the single consumer driving the search, one request at a time
//! - **BundleSearchEngine**: subset x ordering enumeration priced through the cost oracle
//! - **ResultDistributor**: direct reply, per-requester pull cache, broadcast topic
//! - **StatusBoard**: worker health signal
//! - **BundlingService**: lifecycle facade over all of the above

pub mod bundle_search;
pub mod health;
pub mod result_distributor;
pub mod service;
pub mod shutdown;
pub mod task_queue;
pub mod worker;

pub use bundle_search::{
    BundleSearchEngine, PassThroughFilter, SearchOutcome, SearchParams, TaskFilter,
};
pub use health::{StatusBoard, StatusReporter, WorkerStatus};
pub use result_distributor::{
    DeliveryReport, ReplyDestination, ResultBroadcaster, ResultConsumer, ResultDistributor,
};
pub use service::BundlingService;
pub use shutdown::{ShutdownHandle, ShutdownSignal};
pub use task_queue::BundlingQueue;
pub use worker::{BundlingWorker, WorkerMetrics, WorkerMetricsSnapshot, WorkerSettings};
