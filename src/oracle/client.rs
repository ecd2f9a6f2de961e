//! Blocking-style cost evaluation against the path planner.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{CostOracle, PathPlanner, PathStore, PlanTask, PlannedPath};
use crate::constants::defaults::PLANNER_BUSY_THRESHOLD;
use crate::error::{PlanningError, PlanningErrorKind};
use crate::models::task::path_length;
use crate::models::{Pose2d, Task};
use crate::orchestration::shutdown::ShutdownSignal;

/// Prices orderings by submitting them to a [`PathPlanner`] and awaiting the
/// answer in a private [`PathStore`].
///
/// Only one evaluation is in flight at a time; the planner is a serialized
/// resource and the single worker drives it sequentially.
pub struct PathCostClient {
    planner: Arc<dyn PathPlanner>,
    store: Arc<PathStore>,
    timeout: Duration,
    shutdown: ShutdownSignal,
    warm_up_enabled: bool,
    warmed_up: AtomicBool,
    busy_reports: AtomicU64,
}

impl std::fmt::Debug for PathCostClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathCostClient")
            .field("timeout", &self.timeout)
            .field("warm_up_enabled", &self.warm_up_enabled)
            .field("warmed_up", &self.warmed_up.load(Ordering::Relaxed))
            .field("busy_reports", &self.busy_reports.load(Ordering::Relaxed))
            .finish()
    }
}

impl PathCostClient {
    pub fn new(planner: Arc<dyn PathPlanner>, timeout: Duration, shutdown: ShutdownSignal) -> Self {
        Self {
            planner,
            store: Arc::new(PathStore::new()),
            timeout,
            shutdown,
            warm_up_enabled: true,
            warmed_up: AtomicBool::new(false),
            busy_reports: AtomicU64::new(0),
        }
    }

    pub fn with_warm_up(mut self, enabled: bool) -> Self {
        self.warm_up_enabled = enabled;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Submissions the planner accepted with more than one job ahead.
    pub fn busy_reports(&self) -> u64 {
        self.busy_reports.load(Ordering::Relaxed)
    }

    /// Submit `coarse_path` and wait for the planner's answer, whatever its status.
    pub async fn plan(&self, coarse_path: Vec<Pose2d>) -> Result<PlannedPath, PlanningError> {
        if self.shutdown.is_shutdown() {
            return Err(PlanningError::cancelled());
        }

        let job_id = Uuid::new_v4();
        self.store.clear();

        debug!(job_id = %job_id, waypoints = coarse_path.len(), "Sending task to path planner");
        let jobs_ahead = self
            .planner
            .set_task(PlanTask {
                job_id,
                coarse_path,
                reply: Arc::clone(&self.store),
            })
            .await?;

        if jobs_ahead > PLANNER_BUSY_THRESHOLD {
            self.busy_reports.fetch_add(1, Ordering::Relaxed);
            warn!(
                jobs_ahead = jobs_ahead,
                "Path planner is busy, there are {jobs_ahead} jobs ahead of us in the queue"
            );
        }

        let started = Instant::now();
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(PlanningError::cancelled()),
            answer = tokio::time::timeout(self.timeout, self.store.wait_for(job_id)) => {
                answer.map_err(|_| {
                    PlanningError::fatal(format!(
                        "Did not receive a reply from the path planner after waiting {:.1}s -- something must be wrong",
                        started.elapsed().as_secs_f64()
                    ))
                })
            }
        }
    }
}

#[async_trait]
impl CostOracle for PathCostClient {
    async fn evaluate(&self, start: &Pose2d, waypoints: &[Task]) -> Result<f64, PlanningError> {
        let mut coarse_path = Vec::with_capacity(waypoints.len() + 1);
        coarse_path.push(*start);
        coarse_path.extend(waypoints.iter().map(|task| task.target));

        let planned = self.plan(coarse_path).await?;

        if !planned.status.is_ok() {
            return Err(PlanningError::temporary(format!(
                "Path planner could not compute. Gave result {}: {}",
                planned.status, planned.description
            )));
        }
        if planned.path.is_empty() {
            return Err(PlanningError::temporary(
                "Path planner reported success but returned an empty path",
            ));
        }

        Ok(path_length(&planned.path))
    }

    /// The first path a freshly started planner computes can be wrong, so a
    /// throw-away job goes out before the first real search of the session.
    async fn warm_up(&self, start: &Pose2d) -> Result<(), PlanningError> {
        if !self.warm_up_enabled || self.warmed_up.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        info!("Flushing path planner with arbitrary task");
        match self.plan(vec![*start]).await {
            Ok(planned) => {
                debug!(status = %planned.status, "Done flushing path planner");
                Ok(())
            }
            // A single-point path may well be rejected; the flush still happened
            Err(e) if e.kind() == PlanningErrorKind::Temporary => Ok(()),
            Err(e) => {
                self.warmed_up.store(false, Ordering::Release);
                Err(e)
            }
        }
    }
}
