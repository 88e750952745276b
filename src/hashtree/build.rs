// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Building trees and witnesses.

use super::HashTree;
use crate::types::Digest;

impl HashTree {
    pub fn fork(left: HashTree, right: HashTree) -> Self {
        HashTree::Fork(Box::new(left), Box::new(right))
    }

    pub fn labeled(label: impl Into<Vec<u8>>, child: HashTree) -> Self {
        HashTree::Labeled(label.into(), Box::new(child))
    }

    pub fn leaf(value: impl Into<Vec<u8>>) -> Self {
        HashTree::Leaf(value.into())
    }

    pub fn pruned(digest: Digest) -> Self {
        HashTree::Pruned(digest)
    }

    /// Balanced tree of `labeled(label, leaf(value))` nodes.
    ///
    /// `entries` must be sorted by label with no duplicates; lookups rely on
    /// that order.
    pub fn from_sorted_entries<L, V>(entries: &[(L, V)]) -> Self
    where
        L: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        match entries {
            [] => HashTree::Empty,
            [(label, value)] => HashTree::labeled(label.as_ref(), HashTree::leaf(value.as_ref())),
            _ => {
                let (left, right) = entries.split_at(entries.len() / 2);
                HashTree::fork(
                    HashTree::from_sorted_entries(left),
                    HashTree::from_sorted_entries(right),
                )
            }
        }
    }

    /// Copy of this tree that keeps the subtree labeled `label` (searched
    /// through forks at this level) and prunes everything else.
    ///
    /// If the label is not present the whole tree collapses to one pruned
    /// node, which still reconstructs to the same root.
    pub fn witness_for(&self, label: &[u8]) -> HashTree {
        self.keep_label(label).0
    }

    fn keep_label(&self, label: &[u8]) -> (HashTree, bool) {
        match self {
            HashTree::Labeled(l, _) if l.as_slice() == label => (self.clone(), true),
            HashTree::Fork(left, right) => {
                let (left_witness, in_left) = left.keep_label(label);
                let (right_witness, in_right) = right.keep_label(label);
                if in_left || in_right {
                    (HashTree::fork(left_witness, right_witness), true)
                } else {
                    (HashTree::Pruned(self.reconstruct()), false)
                }
            }
            HashTree::Pruned(_) => (self.clone(), false),
            _ => (HashTree::Pruned(self.reconstruct()), false),
        }
    }
}
