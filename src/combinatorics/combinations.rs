//! k-subsets of a candidate pool.

use super::binomial;

/// Iterator over all k-element subsets of `pool`, in lexicographic index order.
///
/// `k` larger than the pool is clamped to the pool size, and `k == 0` (or an
/// empty pool) yields exactly one empty subset. Call [`Combinations::reset`] to
/// walk the subsets again.
#[derive(Debug, Clone)]
pub struct Combinations<'a, T> {
    pool: &'a [T],
    /// Current subset as strictly increasing pool indices.
    indices: Vec<usize>,
    done: bool,
}

impl<'a, T: Clone> Combinations<'a, T> {
    pub fn new(pool: &'a [T], k: usize) -> Self {
        let k = k.min(pool.len());
        Self {
            pool,
            indices: (0..k).collect(),
            done: false,
        }
    }

    /// Size of every subset this generator yields, after clamping.
    pub fn subset_size(&self) -> usize {
        self.indices.len()
    }

    /// Number of subsets a full pass yields.
    pub fn total(&self) -> usize {
        binomial(self.pool.len(), self.indices.len())
    }

    pub fn reset(&mut self) {
        for (position, index) in self.indices.iter_mut().enumerate() {
            *index = position;
        }
        self.done = false;
    }

    fn advance(&mut self) -> bool {
        let n = self.pool.len();
        let k = self.indices.len();

        // Find the rightmost index that can still move right
        for i in (0..k).rev() {
            if self.indices[i] < n - k + i {
                self.indices[i] += 1;
                for j in (i + 1)..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                return true;
            }
        }
        false
    }
}

impl<T: Clone> Iterator for Combinations<'_, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let subset = self
            .indices
            .iter()
            .map(|&index| self.pool[index].clone())
            .collect();

        if !self.advance() {
            self.done = true;
        }

        Some(subset)
    }
}
