//! # Combinatorial Generators
//!
//! Lazy, restartable generators behind the bundle search:
//!
//! - [`Combinations`]: every k-element subset of a candidate pool, each subset
//!   keeping the pool's relative order.
//! - [`Permutations`]: every ordering of a small group.
//! - [`Interleavings`]: every way to merge a group into a fixed-order host
//!   sequence without disturbing the host's order. Each ordering is computed
//!   directly from its index ("magic number"), so the count stays at
//!   C(m + p, p) instead of enumerating and filtering (m + p)! permutations.
//!
//! All generators are pure and allocation-light; they hand out owned `Vec`s so
//! callers can move them straight into a bundle.

pub mod combinations;
pub mod interleavings;
pub mod permutations;

pub use combinations::Combinations;
pub use interleavings::{insertion_slots, Interleavings};
pub use permutations::Permutations;

/// Binomial coefficient C(n, k); saturates instead of overflowing.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    if k == 0 || k == n {
        return 1;
    }

    let k = k.min(n - k); // Use symmetry
    let mut result: usize = 1;
    for i in 0..k {
        result = result.saturating_mul(n - i) / (i + 1);
    }
    result
}

/// n!, saturating at `usize::MAX`.
pub fn factorial(n: usize) -> usize {
    (1..=n).fold(1usize, |acc, i| acc.saturating_mul(i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(0, 0), 1);
        assert_eq!(binomial(5, 0), 1);
        assert_eq!(binomial(5, 2), 10);
        assert_eq!(binomial(5, 5), 1);
        assert_eq!(binomial(3, 4), 0);
        assert_eq!(binomial(10, 3), 120);
    }

    #[test]
    fn test_factorial() {
        assert_eq!(factorial(0), 1);
        assert_eq!(factorial(1), 1);
        assert_eq!(factorial(5), 120);
        assert_eq!(factorial(100), usize::MAX);
    }
}
