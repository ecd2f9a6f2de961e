//! # Bundle Search Engine
//!
//! Finds the cheapest ways to fold new candidate tasks into an agent's
//! committed task list.
//!
//! For every bundle size `k` from 1 to `max_bundle_size` the engine walks all
//! k-subsets of the candidates. Each subset is joined with the permutable tail
//! of the committed list to form an insertion group, and every ordering of that
//! group is merged into the fixed committed prefix in every order-preserving
//! way. Every resulting ordering is priced through the [`CostOracle`], and the
//! cheapest ordering of each subset competes for a place in the result.
//!
//! A planning error from the oracle aborts the whole search; the caller gets
//! the error with its kind intact and no partial bundle list.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

use crate::combinatorics::{Combinations, Interleavings, Permutations};
use crate::error::PlanningError;
use crate::models::{Bundle, BundleList, BundlingRequest, Pose2d, Task, TaskList};
use crate::oracle::CostOracle;

/// Limits for one search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    pub max_bundle_size: usize,
    pub max_bundles: usize,
    /// Trailing committed tasks allowed to move; clamped to the committed length.
    pub permutable_tail: usize,
}

/// Bundles found by one search plus how much work it took.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    /// Cheapest first, at most `max_bundles` long.
    pub bundles: BundleList,
    pub orderings_evaluated: usize,
    pub subsets_considered: usize,
}

/// Prunes candidates that cannot appear in a competitive bundle before the
/// search starts.
pub trait TaskFilter: Send + Sync {
    fn filter(&self, start: &Pose2d, committed: &[Task], candidates: TaskList) -> TaskList;
}

/// Keeps every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughFilter;

impl TaskFilter for PassThroughFilter {
    fn filter(&self, _start: &Pose2d, _committed: &[Task], candidates: TaskList) -> TaskList {
        candidates
    }
}

/// Heap entry: ascending cost, ties broken by discovery order.
#[derive(Debug)]
struct RankedBundle {
    bundle: Bundle,
    seq: usize,
}

impl PartialEq for RankedBundle {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankedBundle {}

impl PartialOrd for RankedBundle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankedBundle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bundle
            .cmp_cost(&other.bundle)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

pub struct BundleSearchEngine {
    oracle: Arc<dyn CostOracle>,
    filter: Arc<dyn TaskFilter>,
    permutable_tail: usize,
}

impl std::fmt::Debug for BundleSearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleSearchEngine")
            .field("permutable_tail", &self.permutable_tail)
            .finish_non_exhaustive()
    }
}

impl BundleSearchEngine {
    pub fn new(oracle: Arc<dyn CostOracle>, permutable_tail: usize) -> Self {
        Self {
            oracle,
            filter: Arc::new(PassThroughFilter),
            permutable_tail,
        }
    }

    pub fn with_filter(mut self, filter: Arc<dyn TaskFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn oracle(&self) -> &Arc<dyn CostOracle> {
        &self.oracle
    }

    /// Search with the limits carried by `request` and the engine's tail length.
    pub async fn search_request(
        &self,
        request: &BundlingRequest,
    ) -> Result<SearchOutcome, PlanningError> {
        self.search(
            &request.start,
            &request.committed,
            request.candidates.clone(),
            SearchParams {
                max_bundle_size: request.max_bundle_size,
                max_bundles: request.max_bundles,
                permutable_tail: self.permutable_tail,
            },
        )
        .await
    }

    #[instrument(
        skip(self, start, committed, candidates),
        fields(committed = committed.len(), candidates = candidates.len())
    )]
    pub async fn search(
        &self,
        start: &Pose2d,
        committed: &[Task],
        candidates: TaskList,
        params: SearchParams,
    ) -> Result<SearchOutcome, PlanningError> {
        let mut outcome = SearchOutcome::default();
        if params.max_bundles == 0 || params.max_bundle_size == 0 {
            debug!(
                max_bundles = params.max_bundles,
                max_bundle_size = params.max_bundle_size,
                "Nothing to bundle, skipping search"
            );
            return Ok(outcome);
        }

        let candidates = self.filter.filter(start, committed, candidates);

        let tail = params.permutable_tail.min(committed.len());
        let (fixed, movable) = committed.split_at(committed.len() - tail);

        // With no candidates the committed list is still priced once
        let sizes = if candidates.is_empty() {
            0..=0
        } else {
            1..=params.max_bundle_size.min(candidates.len())
        };

        let mut ranked: BinaryHeap<Reverse<RankedBundle>> = BinaryHeap::new();

        for k in sizes {
            for subset in Combinations::new(&candidates, k) {
                outcome.subsets_considered += 1;

                let mut group = subset;
                group.extend_from_slice(movable);
                if group.is_empty() && fixed.is_empty() {
                    continue;
                }

                let best = self
                    .best_ordering(start, fixed, group, &mut outcome.orderings_evaluated)
                    .await?;

                if let Some(bundle) = best {
                    debug!(k = k, cost = bundle.cost, tasks = bundle.len(), "Best ordering for subset");
                    let seq = ranked.len();
                    ranked.push(Reverse(RankedBundle { bundle, seq }));
                }
            }
        }

        while outcome.bundles.len() < params.max_bundles {
            match ranked.pop() {
                Some(Reverse(entry)) => outcome.bundles.push(entry.bundle),
                None => break,
            }
        }

        debug!(
            bundles = outcome.bundles.len(),
            orderings = outcome.orderings_evaluated,
            subsets = outcome.subsets_considered,
            "Bundle search finished"
        );
        Ok(outcome)
    }

    /// Price every ordering of `group` merged into `fixed` and keep the cheapest.
    async fn best_ordering(
        &self,
        start: &Pose2d,
        fixed: &[Task],
        group: TaskList,
        evaluated: &mut usize,
    ) -> Result<Option<Bundle>, PlanningError> {
        let mut best: Option<Bundle> = None;

        for arrangement in Permutations::new(group) {
            let orderings: Vec<TaskList> = if fixed.is_empty() {
                vec![arrangement]
            } else {
                Interleavings::new(&arrangement, fixed).collect()
            };

            for ordering in orderings {
                let cost = self.oracle.evaluate(start, &ordering).await?;
                *evaluated += 1;
                trace!(cost = cost, tasks = ordering.len(), "Evaluated ordering");

                match &best {
                    Some(current) if current.cost <= cost => {}
                    _ => best = Some(Bundle::new(ordering, cost)),
                }
            }
        }
        Ok(best)
    }
}
