//! All orderings of a small group.

use super::factorial;

/// Iterator over every ordering of `items`, starting with the given order and
/// proceeding in lexicographic order of positions.
///
/// Orderings are generated over positions, not values, so equal items still
/// produce `n!` orderings.
#[derive(Debug, Clone)]
pub struct Permutations<T> {
    items: Vec<T>,
    indices: Vec<usize>,
    done: bool,
}

impl<T: Clone> Permutations<T> {
    pub fn new(items: Vec<T>) -> Self {
        let indices = (0..items.len()).collect();
        Self {
            items,
            indices,
            done: false,
        }
    }

    pub fn total(&self) -> usize {
        factorial(self.items.len())
    }

    pub fn reset(&mut self) {
        for (position, index) in self.indices.iter_mut().enumerate() {
            *index = position;
        }
        self.done = false;
    }
}

/// Rearrange `indices` into the next lexicographic permutation; false once the
/// last (descending) permutation has been reached.
fn next_permutation(indices: &mut [usize]) -> bool {
    if indices.len() < 2 {
        return false;
    }

    let Some(pivot) = (0..indices.len() - 1)
        .rev()
        .find(|&i| indices[i] < indices[i + 1])
    else {
        return false;
    };

    let successor = (pivot + 1..indices.len())
        .rev()
        .find(|&j| indices[j] > indices[pivot])
        .unwrap_or(pivot + 1);

    indices.swap(pivot, successor);
    indices[pivot + 1..].reverse();
    true
}

impl<T: Clone> Iterator for Permutations<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let ordering = self
            .indices
            .iter()
            .map(|&index| self.items[index].clone())
            .collect();

        if !next_permutation(&mut self.indices) {
            self.done = true;
        }

        Some(ordering)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_three_items() {
        let orderings: Vec<Vec<u8>> = Permutations::new(vec![1, 2, 3]).collect();
        assert_eq!(
            orderings,
            vec![
                vec![1, 2, 3],
                vec![1, 3, 2],
                vec![2, 1, 3],
                vec![2, 3, 1],
                vec![3, 1, 2],
                vec![3, 2, 1],
            ]
        );
    }

    #[test]
    fn test_empty_and_single() {
        let empty: Vec<Vec<u8>> = Permutations::new(Vec::new()).collect();
        assert_eq!(empty, vec![Vec::<u8>::new()]);

        let single: Vec<Vec<u8>> = Permutations::new(vec![9]).collect();
        assert_eq!(single, vec![vec![9]]);
    }

    #[test]
    fn test_equal_items_still_counted_by_position() {
        let permutations = Permutations::new(vec!['x', 'x', 'y']);
        assert_eq!(permutations.total(), 6);
        assert_eq!(permutations.count(), 6);
    }

    #[test]
    fn test_all_distinct() {
        let orderings: HashSet<Vec<u8>> = Permutations::new(vec![1, 2, 3, 4]).collect();
        assert_eq!(orderings.len(), 24);
    }
}
