//! Shared helpers for the integration tests
#![allow(dead_code)]

pub mod strategies;

use async_trait::async_trait;
use bundler_core::config::BundlerConfig;
use bundler_core::error::{PlanningError, Result};
use bundler_core::models::task::path_length;
use bundler_core::models::{BundlingResult, Pose2d, Task, TaskList};
use bundler_core::oracle::CostOracle;
use bundler_core::orchestration::ResultConsumer;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn task(x: f64, y: f64) -> Task {
    Task::new(x, y, 0.0)
}

/// Defaults with the waits shortened so tests settle quickly
pub fn fast_config() -> BundlerConfig {
    let mut config = BundlerConfig::default();
    config.planner.path_plan_timeout_seconds = 2.0;
    config.queue.idle_heartbeat_ms = 20;
    config.worker.recovery_pause_ms = 10;
    config
}

/// Poll `condition` until it holds; panics after `limit`.
pub async fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(limit, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Straight-line oracle that counts and records every ordering it prices
#[derive(Default)]
pub struct CountingOracle {
    evaluations: AtomicUsize,
    priced: Mutex<Vec<(TaskList, f64)>>,
}

impl CountingOracle {
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }

    pub fn priced(&self) -> Vec<(TaskList, f64)> {
        self.priced.lock().clone()
    }
}

#[async_trait]
impl CostOracle for CountingOracle {
    async fn evaluate(
        &self,
        start: &Pose2d,
        waypoints: &[Task],
    ) -> std::result::Result<f64, PlanningError> {
        assert!(!waypoints.is_empty(), "zero-waypoint ordering was priced");
        let mut path = vec![*start];
        path.extend(waypoints.iter().map(|t| t.target));
        let cost = path_length(&path);

        self.evaluations.fetch_add(1, Ordering::SeqCst);
        self.priced.lock().push((waypoints.to_vec(), cost));
        Ok(cost)
    }
}

/// Reply destination that keeps everything it is handed
#[derive(Default)]
pub struct RecordingConsumer {
    received: Mutex<Vec<Arc<BundlingResult>>>,
}

impl RecordingConsumer {
    pub fn received(&self) -> Vec<Arc<BundlingResult>> {
        self.received.lock().clone()
    }
}

#[async_trait]
impl ResultConsumer for RecordingConsumer {
    async fn deliver(&self, result: Arc<BundlingResult>) -> Result<()> {
        self.received.lock().push(result);
        Ok(())
    }
}
