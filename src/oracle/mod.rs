//! # Path-Cost Oracle
//!
//! Prices a candidate ordering by asking a path planner for the route through
//! its waypoints. The planner is an external, serialized, possibly slow
//! service: jobs are submitted with [`PathPlanner::set_task`] and answers come
//! back asynchronously into a single-slot [`PathStore`].
//!
//! [`PathCostClient`] turns that exchange into one awaited call with a
//! timeout, shutdown cancellation, and the temporary/fatal error split the
//! worker loop relies on.

pub mod client;
pub mod local;
pub mod store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::PlanningError;
use crate::models::{Pose2d, Task};

pub use client::PathCostClient;
pub use local::{LocalPathPlanner, LocalPlannerMode};
pub use store::PathStore;

/// Outcome code reported by the path planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathPlanStatus {
    Ok,
    StartNotValid,
    DestinationNotValid,
    DestinationUnreachable,
    OtherError,
}

impl PathPlanStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, PathPlanStatus::Ok)
    }
}

impl fmt::Display for PathPlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPlanStatus::Ok => write!(f, "PathOk"),
            PathPlanStatus::StartNotValid => write!(f, "PathStartNotValid"),
            PathPlanStatus::DestinationNotValid => write!(f, "PathDestinationNotValid"),
            PathPlanStatus::DestinationUnreachable => write!(f, "PathDestinationUnreachable"),
            PathPlanStatus::OtherError => write!(f, "PathOtherError"),
        }
    }
}

/// A job for the planner: route through `coarse_path`, answer into `reply`.
#[derive(Debug, Clone)]
pub struct PlanTask {
    pub job_id: Uuid,
    pub coarse_path: Vec<Pose2d>,
    pub reply: Arc<PathStore>,
}

/// The planner's answer to one job.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPath {
    pub job_id: Uuid,
    pub path: Vec<Pose2d>,
    pub status: PathPlanStatus,
    pub description: String,
}

impl PlannedPath {
    pub fn ok(job_id: Uuid, path: Vec<Pose2d>) -> Self {
        Self {
            job_id,
            path,
            status: PathPlanStatus::Ok,
            description: String::new(),
        }
    }

    pub fn failed(job_id: Uuid, status: PathPlanStatus, description: impl Into<String>) -> Self {
        Self {
            job_id,
            path: Vec::new(),
            status,
            description: description.into(),
        }
    }
}

/// Connection to an external path planner.
#[async_trait]
pub trait PathPlanner: Send + Sync {
    /// Submit a job; returns the number of jobs queued ahead of it. The answer
    /// arrives later in `task.reply`. Transport failures are `RemoteCall` errors.
    async fn set_task(&self, task: PlanTask) -> Result<usize, PlanningError>;
}

/// Anything that can price visiting `waypoints` in order from `start`.
#[async_trait]
pub trait CostOracle: Send + Sync {
    async fn evaluate(&self, start: &Pose2d, waypoints: &[Task]) -> Result<f64, PlanningError>;

    /// Hook run before the first search of a session.
    async fn warm_up(&self, _start: &Pose2d) -> Result<(), PlanningError> {
        Ok(())
    }
}
