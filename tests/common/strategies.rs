use bundler_core::models::Task;
use proptest::prelude::*;

/// Strategy for tasks on an integer grid, so every cost is finite
pub fn task_strategy() -> impl Strategy<Value = Task> {
    (-50i32..=50, -50i32..=50).prop_map(|(x, y)| Task::new(f64::from(x), f64::from(y), 0.0))
}

/// Strategy for small task lists
pub fn task_list_strategy(max_len: usize) -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(task_strategy(), 0..=max_len)
}

/// Strategy for a pool size and a subset size no larger than it
pub fn pool_and_subset_size() -> impl Strategy<Value = (usize, usize)> {
    (1usize..=8).prop_flat_map(|n| (Just(n), 1..=n))
}

/// Strategy for host and group lengths of an interleaving
pub fn host_and_group_len() -> impl Strategy<Value = (usize, usize)> {
    (0usize..=5, 0usize..=4)
}
