//! In-process path planner.
//!
//! Answers with the coarse path unchanged, so every ordering costs its
//! straight-line length. The mode can be switched at runtime to drive the
//! failure branches of the pipeline.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::trace;

use super::{PathPlanStatus, PathPlanner, PlanTask, PlannedPath};
use crate::error::PlanningError;

/// How [`LocalPathPlanner`] answers the jobs it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalPlannerMode {
    /// Reply with the coarse path as the planned path.
    #[default]
    Echo,
    /// Reply with the given failure status and no path.
    Reject(PathPlanStatus),
    /// Accept jobs but never reply.
    Silent,
    /// Refuse jobs at the transport level.
    Unavailable,
}

#[derive(Debug, Default)]
pub struct LocalPathPlanner {
    mode: RwLock<LocalPlannerMode>,
    reply_delay: Option<Duration>,
    jobs_ahead: usize,
    jobs_received: AtomicUsize,
}

impl LocalPathPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: LocalPlannerMode) -> Self {
        Self {
            mode: RwLock::new(mode),
            ..Self::default()
        }
    }

    /// Answer from a spawned task after `delay` instead of inline.
    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = Some(delay);
        self
    }

    /// Report `jobs_ahead` queued jobs on every submission.
    pub fn with_jobs_ahead(mut self, jobs_ahead: usize) -> Self {
        self.jobs_ahead = jobs_ahead;
        self
    }

    pub fn set_mode(&self, mode: LocalPlannerMode) {
        *self.mode.write() = mode;
    }

    pub fn mode(&self) -> LocalPlannerMode {
        *self.mode.read()
    }

    pub fn jobs_received(&self) -> usize {
        self.jobs_received.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PathPlanner for LocalPathPlanner {
    async fn set_task(&self, task: PlanTask) -> Result<usize, PlanningError> {
        let mode = self.mode();
        if mode == LocalPlannerMode::Unavailable {
            return Err(PlanningError::remote_call(
                "local path planner is not accepting jobs",
            ));
        }
        self.jobs_received.fetch_add(1, Ordering::Relaxed);
        trace!(job_id = %task.job_id, ?mode, "Local planner received job");

        let answer = match mode {
            LocalPlannerMode::Echo => PlannedPath::ok(task.job_id, task.coarse_path),
            LocalPlannerMode::Reject(status) => {
                PlannedPath::failed(task.job_id, status, format!("local planner set to {status}"))
            }
            LocalPlannerMode::Silent | LocalPlannerMode::Unavailable => {
                return Ok(self.jobs_ahead)
            }
        };

        match self.reply_delay {
            Some(delay) => {
                let reply = task.reply;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    reply.set(answer);
                });
            }
            None => task.reply.set(answer),
        }
        Ok(self.jobs_ahead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Pose2d;
    use crate::oracle::PathStore;
    use std::sync::Arc;
    use uuid::Uuid;

    fn job(store: &Arc<PathStore>) -> PlanTask {
        PlanTask {
            job_id: Uuid::new_v4(),
            coarse_path: vec![Pose2d::new(0.0, 0.0, 0.0), Pose2d::new(1.0, 1.0, 0.0)],
            reply: Arc::clone(store),
        }
    }

    #[tokio::test]
    async fn test_echo_replies_with_coarse_path() {
        let planner = LocalPathPlanner::new();
        let store = Arc::new(PathStore::new());
        let task = job(&store);
        let expected = task.coarse_path.clone();

        assert_eq!(planner.set_task(task).await.unwrap(), 0);
        let answer = store.take().unwrap();
        assert!(answer.status.is_ok());
        assert_eq!(answer.path, expected);
    }

    #[tokio::test]
    async fn test_mode_switch() {
        let planner = LocalPathPlanner::new();
        let store = Arc::new(PathStore::new());

        planner.set_mode(LocalPlannerMode::Silent);
        planner.set_task(job(&store)).await.unwrap();
        assert!(store.is_empty());

        planner.set_mode(LocalPlannerMode::Reject(PathPlanStatus::StartNotValid));
        planner.set_task(job(&store)).await.unwrap();
        assert_eq!(store.take().unwrap().status, PathPlanStatus::StartNotValid);

        planner.set_mode(LocalPlannerMode::Unavailable);
        assert!(planner.set_task(job(&store)).await.is_err());
        assert_eq!(planner.jobs_received(), 2);
    }

    #[tokio::test]
    async fn test_reports_configured_backlog() {
        let planner = LocalPathPlanner::new().with_jobs_ahead(3);
        let store = Arc::new(PathStore::new());
        assert_eq!(planner.set_task(job(&store)).await.unwrap(), 3);

        planner.set_mode(LocalPlannerMode::Silent);
        assert_eq!(planner.set_task(job(&store)).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delayed_reply() {
        let planner = LocalPathPlanner::new().with_reply_delay(Duration::from_millis(20));
        let store = Arc::new(PathStore::new());
        let task = job(&store);
        let job_id = task.job_id;

        planner.set_task(task).await.unwrap();
        assert!(store.is_empty());
        let answer = tokio::time::timeout(Duration::from_secs(1), store.wait_for(job_id))
            .await
            .unwrap();
        assert_eq!(answer.job_id, job_id);
    }
}
