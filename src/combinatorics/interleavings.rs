//! Order-preserving merges of a group into a fixed host sequence.

use super::permutations::Permutations;
use super::{binomial, factorial};

/// Map an interleaving index (`magic`) to the result slots the group occupies.
///
/// A merge of `group_len` items into `host_len` items is fully described by
/// which `group_len` of the `host_len + group_len` result slots hold group
/// items. This unranks `magic` in the combinatorial number system, so every
/// `magic < C(host_len + group_len, group_len)` maps to a distinct, strictly
/// increasing slot list. Returns `None` for an out-of-range index.
pub fn insertion_slots(magic: usize, host_len: usize, group_len: usize) -> Option<Vec<usize>> {
    let slots = host_len + group_len;
    if magic >= binomial(slots, group_len) {
        return None;
    }

    let mut rank = magic;
    let mut chosen = Vec::with_capacity(group_len);
    let mut slot = 0;
    for placed in 0..group_len {
        let remaining = group_len - placed;
        // Skip every block of merges whose next group slot comes earlier
        loop {
            let block = binomial(slots - slot - 1, remaining - 1);
            if rank < block {
                break;
            }
            rank -= block;
            slot += 1;
        }
        chosen.push(slot);
        slot += 1;
    }
    Some(chosen)
}

#[derive(Debug, Clone)]
enum Source<T> {
    /// No host: every ordering of the group.
    Permute(Permutations<T>),
    /// Host present: magic numbers `next..total` are still to come.
    Magic { next: usize, total: usize },
}

/// Iterator over every way to merge `group` into `host`.
///
/// With a non-empty host, the host keeps its relative order and the group keeps
/// its relative order, giving C(m + p, p) merges. With an empty host there is
/// nothing to merge into, and the generator yields all p! orderings of the
/// group instead. To also vary the group's internal order against a host, feed
/// each ordering from [`Permutations`] through a fresh `Interleavings`.
#[derive(Debug, Clone)]
pub struct Interleavings<'a, T> {
    group: &'a [T],
    host: &'a [T],
    source: Source<T>,
}

impl<'a, T: Clone> Interleavings<'a, T> {
    pub fn new(group: &'a [T], host: &'a [T]) -> Self {
        let source = if host.is_empty() {
            Source::Permute(Permutations::new(group.to_vec()))
        } else {
            Source::Magic {
                next: 0,
                total: binomial(host.len() + group.len(), group.len()),
            }
        };
        Self {
            group,
            host,
            source,
        }
    }

    /// Number of orderings a full pass yields.
    pub fn total(&self) -> usize {
        if self.host.is_empty() {
            factorial(self.group.len())
        } else {
            binomial(self.host.len() + self.group.len(), self.group.len())
        }
    }

    pub fn reset(&mut self) {
        match &mut self.source {
            Source::Permute(permutations) => permutations.reset(),
            Source::Magic { next, .. } => *next = 0,
        }
    }

    /// Build the merge for one magic number without touching iterator state.
    pub fn interleaving_for(&self, magic: usize) -> Option<Vec<T>> {
        let slots = insertion_slots(magic, self.host.len(), self.group.len())?;

        let mut merged = Vec::with_capacity(self.host.len() + self.group.len());
        let mut group_items = self.group.iter();
        let mut host_items = self.host.iter();
        let mut next_group_slot = slots.iter().peekable();

        for slot in 0..self.host.len() + self.group.len() {
            let item = if next_group_slot.next_if(|&&s| s == slot).is_some() {
                group_items.next()
            } else {
                host_items.next()
            };
            merged.extend(item.cloned());
        }
        Some(merged)
    }
}

impl<T: Clone> Iterator for Interleavings<'_, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.source {
            Source::Permute(permutations) => permutations.next(),
            Source::Magic { next, total } => {
                if *next >= *total {
                    return None;
                }
                let magic = *next;
                *next += 1;
                self.interleaving_for(magic)
            }
        }
    }
}
