//! # Bundling Service
//!
//! Wires the queue, worker, result distribution and broadcast topic together
//! and owns their lifecycle. This is the entry point for embedding the bundler:
//!
//! ```rust,no_run
//! use bundler_core::config::BundlerConfig;
//! use bundler_core::models::{BundlingRequest, Pose2d, Task};
//! use bundler_core::oracle::LocalPathPlanner;
//! use bundler_core::orchestration::BundlingService;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> bundler_core::error::Result<()> {
//! let service = BundlingService::start(&BundlerConfig::default(), Arc::new(LocalPathPlanner::new()))?;
//! let request = BundlingRequest::new("robot-1", Pose2d::default())
//!     .with_candidates(vec![Task::new(5.0, 0.0, 0.0)]);
//! service.submit(request)?;
//! // ... later
//! let latest = service.get_latest("robot-1");
//! service.shutdown(Duration::from_secs(5)).await?;
//! # Ok(())
//! # }
//! ```

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::bundle_search::BundleSearchEngine;
use super::health::{StatusBoard, WorkerStatus};
use super::result_distributor::ResultDistributor;
use super::shutdown::ShutdownHandle;
use super::task_queue::BundlingQueue;
use super::worker::{BundlingWorker, WorkerMetrics, WorkerMetricsSnapshot, WorkerSettings};
use crate::config::BundlerConfig;
use crate::error::{BundlerError, Result};
use crate::events::{PublishedResult, ResultPublisher};
use crate::models::{BundlingRequest, BundlingResult};
use crate::oracle::{CostOracle, PathCostClient, PathPlanner};

/// Running bundling pipeline
pub struct BundlingService {
    queue: Arc<BundlingQueue>,
    distributor: Arc<ResultDistributor>,
    publisher: ResultPublisher,
    status: Arc<StatusBoard>,
    metrics: Arc<WorkerMetrics>,
    shutdown: ShutdownHandle,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for BundlingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundlingService")
            .field("queue_depth", &self.queue.len())
            .field("status", &self.status.current())
            .field("running", &self.is_running())
            .finish()
    }
}

impl BundlingService {
    /// Start the pipeline against an external path planner. Must be called
    /// from within a tokio runtime.
    pub fn start(config: &BundlerConfig, planner: Arc<dyn PathPlanner>) -> Result<Self> {
        config.validate()?;
        let (shutdown, signal) = ShutdownHandle::channel();
        let client = PathCostClient::new(planner, config.planner.path_plan_timeout(), signal)
            .with_warm_up(config.planner.warm_up);
        Self::launch(config, Arc::new(client), shutdown)
    }

    /// Start the pipeline with any cost oracle in place of the planner client
    pub fn start_with_oracle(config: &BundlerConfig, oracle: Arc<dyn CostOracle>) -> Result<Self> {
        config.validate()?;
        let (shutdown, _) = ShutdownHandle::channel();
        Self::launch(config, oracle, shutdown)
    }

    fn launch(
        config: &BundlerConfig,
        oracle: Arc<dyn CostOracle>,
        shutdown: ShutdownHandle,
    ) -> Result<Self> {
        let queue = Arc::new(BundlingQueue::new(config.queue.capacity));
        let publisher =
            ResultPublisher::new(config.events.topic.clone(), config.events.broadcast_capacity);
        let distributor = Arc::new(ResultDistributor::new(Arc::new(publisher.clone())));
        let status = Arc::new(StatusBoard::new());

        let worker = BundlingWorker::new(
            Arc::clone(&queue),
            BundleSearchEngine::new(oracle, config.search.permute_last_committed),
            Arc::clone(&distributor),
            status.clone(),
            WorkerSettings::from(config),
            shutdown.signal(),
        );
        let metrics = worker.metrics();
        let handle = tokio::spawn(worker.run());

        info!(
            topic = %publisher.topic(),
            queue_capacity = config.queue.capacity,
            permute_last_committed = config.search.permute_last_committed,
            "Bundling service started"
        );

        Ok(Self {
            queue,
            distributor,
            publisher,
            status,
            metrics,
            shutdown,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Enqueue a request; returns how many requests are ahead of it.
    pub fn submit(&self, request: BundlingRequest) -> Result<usize> {
        let request_id = request.id.clone();
        let sender = request.sender.clone();
        let ahead = self.queue.push(request)?;
        debug!(request_id = %request_id, sender = %sender, queue_depth = ahead, "Request queued");
        Ok(ahead)
    }

    /// Latest result for `requester`; `NotYetAvailable` until one exists.
    pub fn get_latest(&self, requester: &str) -> Result<Arc<BundlingResult>> {
        self.distributor.get_latest(requester)
    }

    /// Receive every published result; drop the receiver to unsubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedResult> {
        self.publisher.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.publisher.subscriber_count()
    }

    pub fn status(&self) -> WorkerStatus {
        self.status.current()
    }

    pub fn status_updates(&self) -> watch::Receiver<WorkerStatus> {
        self.status.subscribe()
    }

    pub fn metrics(&self) -> WorkerMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the worker, abandoning any in-flight planner wait, and close the
    /// topic. Requests still queued are dropped.
    pub async fn shutdown(&self, timeout: Duration) -> Result<()> {
        let worker = self.worker.lock().take();
        let Some(handle) = worker else {
            warn!("Bundling service already stopped");
            return Ok(());
        };

        info!(queue_depth = self.queue.len(), "Bundling service shutdown requested");
        self.queue.close();
        self.shutdown.trigger();

        let joined = tokio::time::timeout(timeout, handle).await;
        self.publisher.close();

        match joined {
            Ok(Ok(())) => {
                info!("Bundling service stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(BundlerError::InvalidState(format!(
                "bundling worker terminated abnormally: {e}"
            ))),
            Err(_) => Err(BundlerError::InvalidState(format!(
                "bundling worker did not stop within {}s",
                timeout.as_secs_f64()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Pose2d, Task};
    use crate::oracle::LocalPathPlanner;

    fn config() -> BundlerConfig {
        let mut config = BundlerConfig::default();
        config.queue.idle_heartbeat_ms = 20;
        config
    }

    #[tokio::test]
    async fn test_submit_and_pull() {
        let service = BundlingService::start(&config(), Arc::new(LocalPathPlanner::new())).unwrap();
        let mut results = service.subscribe();

        let request = BundlingRequest::new("robot-1", Pose2d::default())
            .with_candidates(vec![Task::new(5.0, 0.0, 0.0)]);
        service.submit(request).unwrap();

        let published = tokio::time::timeout(Duration::from_secs(5), results.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(published.result.sender, "robot-1");

        let latest = service.get_latest("robot-1").unwrap();
        assert!((latest.bundles[0].cost - 5.0).abs() < 1e-9);

        service.shutdown(Duration::from_secs(1)).await.unwrap();
        assert!(!service.is_running());
        assert_eq!(service.metrics().processed, 1);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_rejected() {
        let service = BundlingService::start(&config(), Arc::new(LocalPathPlanner::new())).unwrap();
        service.shutdown(Duration::from_secs(1)).await.unwrap();

        let err = service
            .submit(BundlingRequest::new("robot-1", Pose2d::default()))
            .unwrap_err();
        assert!(matches!(err, BundlerError::QueueClosed));
        // Second shutdown is a no-op
        service.shutdown(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = config();
        config.queue.capacity = 0;
        let err = BundlingService::start(&config, Arc::new(LocalPathPlanner::new())).unwrap_err();
        assert!(matches!(err, BundlerError::Configuration(_)));
    }
}
