mod common;

use bundler_core::combinatorics::{binomial, factorial, insertion_slots, Combinations, Interleavings};
use bundler_core::models::Pose2d;
use bundler_core::oracle::{CostOracle, LocalPathPlanner, PathCostClient};
use bundler_core::orchestration::{BundleSearchEngine, SearchParams, ShutdownHandle};
use common::strategies::*;
use common::CountingOracle;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// True if `sub` appears in `full` in the same relative order
fn is_subsequence(sub: &[usize], full: &[usize]) -> bool {
    let mut rest = full.iter();
    sub.iter().all(|item| rest.any(|candidate| candidate == item))
}

proptest! {
    /// Property: every k-subset appears exactly once, in pool order
    #[test]
    fn combinations_are_complete_and_ordered((n, k) in pool_and_subset_size()) {
        let pool: Vec<usize> = (0..n).collect();
        let subsets: Vec<Vec<usize>> = Combinations::new(&pool, k).collect();

        prop_assert_eq!(subsets.len(), binomial(n, k));
        let distinct: HashSet<&Vec<usize>> = subsets.iter().collect();
        prop_assert_eq!(distinct.len(), subsets.len());

        for subset in &subsets {
            prop_assert_eq!(subset.len(), k);
            prop_assert!(is_subsequence(subset, &pool));
        }

        let covered: HashSet<usize> = subsets.iter().flatten().copied().collect();
        prop_assert_eq!(covered.len(), n);
    }

    /// Property: merges are distinct and keep both input orders
    #[test]
    fn interleavings_preserve_host_order((m, p) in host_and_group_len()) {
        let host: Vec<usize> = (0..m).collect();
        let group: Vec<usize> = (100..100 + p).collect();
        let merges: Vec<Vec<usize>> = Interleavings::new(&group, &host).collect();

        let expected = if m == 0 { factorial(p) } else { binomial(m + p, p) };
        prop_assert_eq!(merges.len(), expected);

        let distinct: HashSet<&Vec<usize>> = merges.iter().collect();
        prop_assert_eq!(distinct.len(), merges.len());

        for merged in &merges {
            prop_assert_eq!(merged.len(), m + p);
            prop_assert!(is_subsequence(&host, merged));
            if m > 0 {
                prop_assert!(is_subsequence(&group, merged));
            }
        }
    }

    /// Property: magic numbers map injectively onto increasing slot lists
    #[test]
    fn insertion_slots_are_injective((m, p) in host_and_group_len()) {
        let total = binomial(m + p, p);
        let all: HashSet<Vec<usize>> = (0..total)
            .map(|magic| insertion_slots(magic, m, p).unwrap())
            .collect();
        prop_assert_eq!(all.len(), total);
        prop_assert!(insertion_slots(total, m, p).is_none());
    }

    /// Property: never more bundles than asked for or evaluated, cheapest first
    #[test]
    fn search_results_are_bounded_and_sorted(
        committed in task_list_strategy(2),
        candidates in task_list_strategy(4),
        max_bundle_size in 0usize..=3,
        max_bundles in 0usize..=6,
        permutable_tail in 0usize..=2,
    ) {
        let oracle = Arc::new(CountingOracle::default());
        let engine = BundleSearchEngine::new(oracle.clone(), permutable_tail);
        let outcome = tokio_test::block_on(engine.search(
            &Pose2d::default(),
            &committed,
            candidates.clone(),
            SearchParams { max_bundle_size, max_bundles, permutable_tail },
        ))
        .unwrap();

        prop_assert_eq!(outcome.orderings_evaluated, oracle.evaluations());
        prop_assert!(outcome.bundles.len() <= max_bundles);
        prop_assert!(outcome.bundles.len() <= outcome.orderings_evaluated);
        prop_assert!(outcome.bundles.windows(2).all(|pair| pair[0].cost <= pair[1].cost));

        for bundle in &outcome.bundles {
            for task in &committed {
                prop_assert!(bundle.contains(task));
            }
            prop_assert!(bundle.len() <= committed.len() + max_bundle_size.max(1));
        }
    }

    /// Property: pricing the same sequence twice gives the same cost
    #[test]
    fn oracle_client_is_idempotent(waypoints in task_list_strategy(5)) {
        let (first, second) = tokio_test::block_on(async {
            let (_handle, signal) = ShutdownHandle::channel();
            let client = PathCostClient::new(
                Arc::new(LocalPathPlanner::new()),
                Duration::from_secs(1),
                signal,
            );
            let start = Pose2d::new(1.0, -1.0, 0.0);
            (
                client.evaluate(&start, &waypoints).await.unwrap(),
                client.evaluate(&start, &waypoints).await.unwrap(),
            )
        });
        prop_assert!((first - second).abs() < 1e-9);
    }
}
