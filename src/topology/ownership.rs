//! Ownership metadata for elements shared between partitions.
//!
//! An element on a partition boundary exists on every partition listed in its
//! [`PartitionList`]. Exactly one of them holds it as [`ParallelMode::Local`];
//! the others hold a [`ParallelMode::Remote`] mirror that is refreshed only
//! through the unpack path and never contributes to local assembly.
//!
//! In serial runs every element is `Local` with an empty partition list.

use std::collections::BTreeSet;

/// Parallel role of an element on the current partition.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum ParallelMode {
    /// Fully owned, computed and assembled here.
    #[default]
    Local,
    /// Read-mostly mirror of an element owned by another partition.
    Remote,
}

impl ParallelMode {
    pub fn is_local(self) -> bool {
        matches!(self, ParallelMode::Local)
    }

    pub fn is_remote(self) -> bool {
        matches!(self, ParallelMode::Remote)
    }

    pub(crate) fn to_wire(self) -> u8 {
        match self {
            ParallelMode::Local => 0,
            ParallelMode::Remote => 1,
        }
    }

    pub(crate) fn from_wire(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(ParallelMode::Local),
            1 => Some(ParallelMode::Remote),
            _ => None,
        }
    }
}

/// Sorted, duplicate-free set of partition ranks sharing an element.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PartitionList {
    ranks: Vec<usize>,
}

impl PartitionList {
    /// Empty list (serial deployment).
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of partitions sharing the element.
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// Returns true for an element that is not shared.
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Returns true if `rank` shares the element.
    pub fn contains(&self, rank: usize) -> bool {
        self.ranks.binary_search(&rank).is_ok()
    }

    /// Add a rank, keeping the list sorted. Returns false if already present.
    pub fn insert(&mut self, rank: usize) -> bool {
        match self.ranks.binary_search(&rank) {
            Ok(_) => false,
            Err(pos) => {
                self.ranks.insert(pos, rank);
                true
            }
        }
    }

    /// Iterate ranks in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranks.iter().copied()
    }

    /// Ranks other than `my_rank`, ascending.
    pub fn peers(&self, my_rank: usize) -> impl Iterator<Item = usize> + '_ {
        self.iter().filter(move |&r| r != my_rank)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.ranks
    }

    /// Collect all ranks into a sorted set.
    pub fn to_set(&self) -> BTreeSet<usize> {
        self.ranks.iter().copied().collect()
    }
}

impl FromIterator<usize> for PartitionList {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let set: BTreeSet<usize> = iter.into_iter().collect();
        Self {
            ranks: set.into_iter().collect(),
        }
    }
}

impl From<Vec<usize>> for PartitionList {
    fn from(ranks: Vec<usize>) -> Self {
        ranks.into_iter().collect()
    }
}
