//! Priced task orderings.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::task::{Task, TaskList};

/// An ordered sequence of tasks and the path length of visiting them in that
/// order from the requester's start pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub tasks: TaskList,
    pub cost: f64,
}

impl Bundle {
    pub fn new(tasks: TaskList, cost: f64) -> Self {
        Self { tasks, cost }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, task: &Task) -> bool {
        self.tasks.contains(task)
    }

    /// Ascending-cost ordering, total over NaN.
    pub fn cmp_cost(&self, other: &Bundle) -> Ordering {
        self.cost.total_cmp(&other.cost)
    }
}

pub type BundleList = Vec<Bundle>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_ordering() {
        let cheap = Bundle::new(vec![Task::new(1.0, 0.0, 0.0)], 1.0);
        let dear = Bundle::new(vec![Task::new(9.0, 0.0, 0.0)], 9.0);

        let mut bundles = vec![dear.clone(), cheap.clone()];
        bundles.sort_by(Bundle::cmp_cost);
        assert_eq!(bundles, vec![cheap, dear]);
    }
}
