//! # Bundling Worker
//!
//! The single consumer of the request queue. Requests are processed one at a
//! time in arrival order; the path planner behind the oracle is a serialized
//! resource, so there is nothing to gain from running searches side by side.
//!
//! A failed request is never retried. Recoverable failures put the worker in a
//! warning state and pause it briefly; unrecoverable ones raise a fault. In
//! both cases the loop moves on to the next request.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use super::bundle_search::BundleSearchEngine;
use super::health::{StatusReporter, WorkerStatus};
use super::result_distributor::ResultDistributor;
use super::shutdown::ShutdownSignal;
use super::task_queue::BundlingQueue;
use crate::config::BundlerConfig;
use crate::constants::operations;
use crate::error::{PlanningError, PlanningErrorKind};
use crate::logging::log_bundling_operation;
use crate::models::{BundlingRequest, BundlingResult};

/// Counters kept by the worker loop
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    processed: AtomicU64,
    temporary_failures: AtomicU64,
    fatal_failures: AtomicU64,
    sweeps: AtomicU64,
    evicted: AtomicU64,
}

/// Point-in-time copy of [`WorkerMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerMetricsSnapshot {
    /// Requests that produced a published result
    pub processed: u64,
    pub temporary_failures: u64,
    /// Planner timeouts and transport failures
    pub fatal_failures: u64,
    pub sweeps: u64,
    pub evicted: u64,
}

impl WorkerMetrics {
    pub fn snapshot(&self) -> WorkerMetricsSnapshot {
        WorkerMetricsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            temporary_failures: self.temporary_failures.load(Ordering::Relaxed),
            fatal_failures: self.fatal_failures.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }
}

/// Loop cadence, taken from the `queue` and `worker` config sections
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    pub idle_heartbeat: Duration,
    pub backlog_warning_threshold: usize,
    pub cleanup_every_requests: u64,
    pub recovery_pause: Duration,
}

impl From<&BundlerConfig> for WorkerSettings {
    fn from(config: &BundlerConfig) -> Self {
        Self {
            idle_heartbeat: config.queue.idle_heartbeat(),
            backlog_warning_threshold: config.queue.backlog_warning_threshold,
            cleanup_every_requests: config.worker.cleanup_every_requests.max(1),
            recovery_pause: config.worker.recovery_pause(),
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self::from(&BundlerConfig::default())
    }
}

/// What the loop does after one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

pub struct BundlingWorker {
    queue: Arc<BundlingQueue>,
    engine: BundleSearchEngine,
    distributor: Arc<ResultDistributor>,
    status: Arc<dyn StatusReporter>,
    metrics: Arc<WorkerMetrics>,
    settings: WorkerSettings,
    shutdown: ShutdownSignal,
}

impl BundlingWorker {
    pub fn new(
        queue: Arc<BundlingQueue>,
        engine: BundleSearchEngine,
        distributor: Arc<ResultDistributor>,
        status: Arc<dyn StatusReporter>,
        settings: WorkerSettings,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            queue,
            engine,
            distributor,
            status,
            metrics: Arc::new(WorkerMetrics::default()),
            settings,
            shutdown,
        }
    }

    pub fn metrics(&self) -> Arc<WorkerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Consume requests until shutdown, or until the queue is closed and drained.
    pub async fn run(self) {
        info!(
            queue_capacity = self.queue.capacity(),
            idle_heartbeat_ms = self.settings.idle_heartbeat.as_millis() as u64,
            "Starting bundling worker"
        );
        self.status
            .report(WorkerStatus::Initializing("waiting for requests".to_string()))
            .await;

        let mut consumed: u64 = 0;
        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                next = self.queue.pop_next(self.settings.idle_heartbeat) => next,
            };

            let Some(request) = next else {
                if self.queue.is_closed() && self.queue.is_empty() {
                    break;
                }
                self.status.report(WorkerStatus::Ok).await;
                continue;
            };

            if consumed > 0 && consumed % self.settings.cleanup_every_requests == 0 {
                self.sweep();
            }
            consumed += 1;

            if self.process(request).await == Flow::Stop {
                break;
            }
        }

        info!(
            consumed = consumed,
            metrics = ?self.metrics.snapshot(),
            "Bundling worker stopped"
        );
    }

    fn sweep(&self) {
        let evicted = self.distributor.sweep();
        self.metrics.sweeps.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .evicted
            .fetch_add(evicted as u64, Ordering::Relaxed);
        debug!(operation = operations::CACHE_SWEPT, evicted = evicted, "Result caches swept");
    }

    #[instrument(skip(self, request), fields(request_id = %request.id, sender = %request.sender))]
    async fn process(&self, request: BundlingRequest) -> Flow {
        let started = Instant::now();
        log_bundling_operation(
            operations::REQUEST_RECEIVED,
            &request.id,
            &request.sender,
            "received",
            None,
            Some(&format!(
                "{} committed, {} candidates",
                request.committed.len(),
                request.candidates.len()
            )),
        );

        let searched = match self.engine.oracle().warm_up(&request.start).await {
            Ok(()) => self.engine.search_request(&request).await,
            Err(e) => Err(e),
        };

        let outcome = match searched {
            Ok(outcome) => outcome,
            Err(e) => return self.handle_failure(&request, e).await,
        };

        let bundle_count = outcome.bundles.len();
        let result = BundlingResult::new(&request, outcome.bundles);
        let report = self
            .distributor
            .distribute(result, request.reply_to.as_ref())
            .await;
        self.metrics.processed.fetch_add(1, Ordering::Relaxed);

        log_bundling_operation(
            operations::REQUEST_COMPLETED,
            &request.id,
            &request.sender,
            "ok",
            Some(bundle_count),
            Some(&format!(
                "{} orderings in {}ms",
                outcome.orderings_evaluated,
                started.elapsed().as_millis()
            )),
        );

        let waiting = self.queue.len();
        if waiting > self.settings.backlog_warning_threshold {
            warn!(queue_depth = waiting, "Requests are piling up");
            self.status
                .report(WorkerStatus::Warning(format!(
                    "Tasks are piling up: there are {waiting} in the queue"
                )))
                .await;
        } else if report.reply_failed() {
            self.status
                .report(WorkerStatus::Warning(format!(
                    "Reply destination of '{}' is unreachable",
                    request.sender
                )))
                .await;
        } else {
            self.status.report(WorkerStatus::Ok).await;
        }

        Flow::Continue
    }

    async fn handle_failure(&self, request: &BundlingRequest, e: PlanningError) -> Flow {
        match e.kind() {
            PlanningErrorKind::Cancelled => {
                info!("Planner wait abandoned, stopping without publishing");
                Flow::Stop
            }
            PlanningErrorKind::Temporary => {
                self.metrics
                    .temporary_failures
                    .fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "Recoverable planning failure, skipping request");
                log_bundling_operation(
                    operations::REQUEST_FAILED,
                    &request.id,
                    &request.sender,
                    "temporary",
                    None,
                    Some(e.message()),
                );
                self.status
                    .report(WorkerStatus::Warning(e.message().to_string()))
                    .await;

                // Give a degraded planner a moment instead of hammering it
                tokio::select! {
                    biased;
                    _ = self.shutdown.cancelled() => Flow::Stop,
                    _ = tokio::time::sleep(self.settings.recovery_pause) => Flow::Continue,
                }
            }
            PlanningErrorKind::Fatal | PlanningErrorKind::RemoteCall => {
                self.metrics.fatal_failures.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, kind = %e.kind(), "Unrecoverable planning failure, skipping request");
                log_bundling_operation(
                    operations::REQUEST_FAILED,
                    &request.id,
                    &request.sender,
                    "fatal",
                    None,
                    Some(e.message()),
                );
                self.status
                    .report(WorkerStatus::Fault(e.message().to_string()))
                    .await;
                Flow::Continue
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ResultPublisher;
    use crate::models::{Pose2d, Task};
    use crate::oracle::CostOracle;
    use crate::orchestration::health::StatusBoard;
    use crate::orchestration::shutdown::ShutdownHandle;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Oracle that replays scripted answers, then prices straight lines.
    #[derive(Default)]
    struct ScriptedOracle {
        script: Mutex<VecDeque<PlanningError>>,
    }

    #[async_trait]
    impl CostOracle for ScriptedOracle {
        async fn evaluate(&self, start: &Pose2d, waypoints: &[Task]) -> Result<f64, PlanningError> {
            if let Some(e) = self.script.lock().pop_front() {
                return Err(e);
            }
            let mut path = vec![*start];
            path.extend(waypoints.iter().map(|t| t.target));
            Ok(crate::models::task::path_length(&path))
        }
    }

    struct Harness {
        queue: Arc<BundlingQueue>,
        distributor: Arc<ResultDistributor>,
        board: Arc<StatusBoard>,
        metrics: Arc<WorkerMetrics>,
        handle: ShutdownHandle,
        task: tokio::task::JoinHandle<()>,
    }

    /// Straight-line oracle that takes `delay` per evaluation.
    struct SlowOracle {
        delay: Duration,
    }

    #[async_trait]
    impl CostOracle for SlowOracle {
        async fn evaluate(&self, start: &Pose2d, waypoints: &[Task]) -> Result<f64, PlanningError> {
            tokio::time::sleep(self.delay).await;
            let mut path = vec![*start];
            path.extend(waypoints.iter().map(|t| t.target));
            Ok(crate::models::task::path_length(&path))
        }
    }

    fn start(oracle: Arc<dyn CostOracle>, settings: WorkerSettings) -> Harness {
        let (handle, signal) = ShutdownHandle::channel();
        let queue = Arc::new(BundlingQueue::new(16));
        let distributor = Arc::new(ResultDistributor::new(Arc::new(ResultPublisher::default())));
        let board = Arc::new(StatusBoard::new());
        let worker = BundlingWorker::new(
            Arc::clone(&queue),
            BundleSearchEngine::new(oracle, 1),
            Arc::clone(&distributor),
            board.clone(),
            settings,
            signal,
        );
        let metrics = worker.metrics();
        let task = tokio::spawn(worker.run());
        Harness {
            queue,
            distributor,
            board,
            metrics,
            handle,
            task,
        }
    }

    fn fast_settings() -> WorkerSettings {
        WorkerSettings {
            idle_heartbeat: Duration::from_millis(20),
            backlog_warning_threshold: 1,
            cleanup_every_requests: 2,
            recovery_pause: Duration::from_millis(10),
        }
    }

    fn request(sender: &str, id: &str) -> BundlingRequest {
        BundlingRequest::new(sender, Pose2d::default())
            .with_id(id)
            .with_candidates(vec![Task::new(5.0, 0.0, 0.0)])
    }

    async fn wait_for_processed(metrics: &WorkerMetrics, count: u64) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while metrics.snapshot().processed
                + metrics.snapshot().temporary_failures
                + metrics.snapshot().fatal_failures
                < count
            {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("worker should process requests");
    }

    #[tokio::test]
    async fn test_processes_and_caches_result() {
        let harness = start(Arc::new(ScriptedOracle::default()), fast_settings());
        harness.queue.push(request("robot-1", "a")).unwrap();
        wait_for_processed(&harness.metrics, 1).await;

        let result = harness.distributor.get_latest("robot-1").unwrap();
        assert_eq!(result.request_id, "a");
        assert!((result.bundles[0].cost - 5.0).abs() < 1e-9);

        harness.handle.trigger();
        harness.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_loop() {
        let oracle = Arc::new(ScriptedOracle::default());
        oracle
            .script
            .lock()
            .extend([PlanningError::fatal("stuck"), PlanningError::temporary("unreachable")]);
        let harness = start(oracle, fast_settings());

        for id in ["a", "b", "c"] {
            harness.queue.push(request("robot-1", id)).unwrap();
        }
        wait_for_processed(&harness.metrics, 3).await;

        let metrics = harness.metrics.snapshot();
        assert_eq!(metrics.fatal_failures, 1);
        assert_eq!(metrics.temporary_failures, 1);
        assert_eq!(metrics.processed, 1);
        assert_eq!(harness.distributor.get_latest("robot-1").unwrap().request_id, "c");

        harness.handle.trigger();
        harness.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_fatal_failure_raises_fault() {
        let oracle = Arc::new(ScriptedOracle::default());
        oracle.script.lock().push_back(PlanningError::fatal("stuck"));
        let mut settings = fast_settings();
        settings.idle_heartbeat = Duration::from_secs(5);
        let harness = start(oracle, settings);
        let mut updates = harness.board.subscribe();

        harness.queue.push(request("robot-1", "a")).unwrap();
        let status = tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|status| status.is_fault()),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();
        assert_eq!(status, WorkerStatus::Fault("stuck".to_string()));

        harness.handle.trigger();
        harness.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_backlog_raises_warning() {
        let oracle = Arc::new(SlowOracle {
            delay: Duration::from_millis(100),
        });
        let harness = start(oracle, fast_settings());
        let mut updates = harness.board.subscribe();

        for id in ["a", "b", "c", "d", "e"] {
            harness.queue.push(request("robot-1", id)).unwrap();
        }

        let status = tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|status| matches!(status, WorkerStatus::Warning(_))),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();
        assert_eq!(
            status,
            WorkerStatus::Warning("Tasks are piling up: there are 4 in the queue".to_string())
        );

        // Drained queue clears the warning
        wait_for_processed(&harness.metrics, 5).await;
        assert_eq!(harness.board.current(), WorkerStatus::Ok);

        harness.handle.trigger();
        harness.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_periodic_sweep_evicts_unread() {
        let harness = start(Arc::new(ScriptedOracle::default()), fast_settings());
        harness.queue.push(request("never-reads", "a")).unwrap();
        harness.queue.push(request("other", "b")).unwrap();
        wait_for_processed(&harness.metrics, 2).await;
        // Third request starts the sweep that evicts both unread entries
        harness.queue.push(request("other", "c")).unwrap();
        wait_for_processed(&harness.metrics, 3).await;

        let metrics = harness.metrics.snapshot();
        assert_eq!(metrics.sweeps, 1);
        assert_eq!(metrics.evicted, 2);
        assert!(harness
            .distributor
            .get_latest("never-reads")
            .unwrap_err()
            .is_not_yet_available());

        harness.handle.trigger();
        harness.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_stops_idle_worker() {
        let harness = start(Arc::new(ScriptedOracle::default()), fast_settings());
        harness.handle.trigger();
        tokio::time::timeout(Duration::from_secs(1), harness.task)
            .await
            .expect("worker should stop promptly")
            .unwrap();
    }

    #[tokio::test]
    async fn test_closed_queue_ends_loop() {
        let harness = start(Arc::new(ScriptedOracle::default()), fast_settings());
        harness.queue.push(request("robot-1", "a")).unwrap();
        harness.queue.close();
        tokio::time::timeout(Duration::from_secs(1), harness.task)
            .await
            .expect("worker should drain and stop")
            .unwrap();
        assert_eq!(harness.metrics.snapshot().processed, 1);
        drop(harness.handle);
    }
}
