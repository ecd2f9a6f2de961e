//! Target poses and the tasks built on them.

use serde::{Deserialize, Serialize};

/// A 2D pose: position plus heading in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2d {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub heading: f64,
}

impl Pose2d {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    /// Euclidean distance between the positions; heading is ignored.
    pub fn distance_to(&self, other: &Pose2d) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// A task is a target pose the agent has to visit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Task {
    pub target: Pose2d,
}

impl Task {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            target: Pose2d::new(x, y, heading),
        }
    }

    pub fn target(&self) -> &Pose2d {
        &self.target
    }
}

impl From<Pose2d> for Task {
    fn from(target: Pose2d) -> Self {
        Self { target }
    }
}

/// Ordered sequence of tasks. For committed lists the order is the visiting
/// order; for candidate pools only the position matters.
pub type TaskList = Vec<Task>;

/// Total length of the polyline through `path`.
pub fn path_length(path: &[Pose2d]) -> f64 {
    path.windows(2).map(|leg| leg[0].distance_to(&leg[1])).sum()
}
