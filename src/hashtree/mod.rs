// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Labeled, partially pruned Merkle trees.
//!
//! A store commits to its contents as a hash tree whose root digest ends up
//! in a signed certificate. A witness is the same tree with every subtree that
//! is irrelevant to a read replaced by its digest; reconstructing the root
//! from the witness must give exactly the certified digest.
//!
//! # Node digests
//! ```text
//! empty           H(sep("ic-hashtree-empty"))
//! fork(l, r)      H(sep("ic-hashtree-fork")    || digest(l) || digest(r))
//! labeled(l, t)   H(sep("ic-hashtree-labeled") || l || digest(t))
//! leaf(v)         H(sep("ic-hashtree-leaf")    || v)
//! pruned(d)       d
//! ```
//! where `H` is SHA-256 and `sep(s) = [len(s)] || s`. The separators keep a
//! leaf from ever hashing like a fork or a labeled node.

mod build;
mod codec;

pub use codec::{decode_witness, encode};
pub(crate) use codec::{tree_from_value, tree_to_value};

use sha2::{Digest as _, Sha256};

use crate::types::Digest;

const EMPTY_DOMAIN: &str = "ic-hashtree-empty";
const FORK_DOMAIN: &str = "ic-hashtree-fork";
const LABELED_DOMAIN: &str = "ic-hashtree-labeled";
const LEAF_DOMAIN: &str = "ic-hashtree-leaf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashTree {
    Empty,
    Fork(Box<HashTree>, Box<HashTree>),
    Labeled(Vec<u8>, Box<HashTree>),
    Leaf(Vec<u8>),
    Pruned(Digest),
}

/// Outcome of walking a label path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupResult<'a> {
    /// The path ends on a leaf holding this value.
    Found(&'a [u8]),
    /// The tree proves the path does not exist.
    Absent,
    /// Pruning hides whether the path exists.
    Unknown,
    /// The path ends on something other than a leaf.
    Error,
}

enum LabelSearch<'a> {
    Found(&'a HashTree),
    Absent,
    Unknown,
    /// Every label in the subtree sorts after the one searched for.
    Less,
    /// Every label in the subtree sorts before the one searched for.
    Greater,
    /// The subtree holds no labels at all.
    NoLabels,
}

impl HashTree {
    /// Folds the tree into its root digest.
    pub fn reconstruct(&self) -> Digest {
        match self {
            HashTree::Empty => domain_hash(EMPTY_DOMAIN, &[]),
            HashTree::Fork(left, right) => {
                let l = left.reconstruct();
                let r = right.reconstruct();
                domain_hash(FORK_DOMAIN, &[l.as_ref(), r.as_ref()])
            }
            HashTree::Labeled(label, child) => {
                let c = child.reconstruct();
                domain_hash(LABELED_DOMAIN, &[label.as_slice(), c.as_ref()])
            }
            HashTree::Leaf(value) => domain_hash(LEAF_DOMAIN, &[value.as_slice()]),
            HashTree::Pruned(digest) => *digest,
        }
    }

    /// Walks `path` from the root, one label per level.
    ///
    /// Labels under a fork are expected in ascending byte order, which is what
    /// lets a partially pruned tree prove absence.
    pub fn lookup_path<L: AsRef<[u8]>>(&self, path: &[L]) -> LookupResult<'_> {
        match path.split_first() {
            None => match self {
                HashTree::Leaf(value) => LookupResult::Found(value),
                HashTree::Pruned(_) => LookupResult::Unknown,
                HashTree::Empty => LookupResult::Absent,
                HashTree::Fork(..) | HashTree::Labeled(..) => LookupResult::Error,
            },
            Some((label, rest)) => match self.lookup_label(label.as_ref()) {
                LabelSearch::Found(child) => child.lookup_path(rest),
                LabelSearch::Unknown => LookupResult::Unknown,
                LabelSearch::Absent
                | LabelSearch::Less
                | LabelSearch::Greater
                | LabelSearch::NoLabels => LookupResult::Absent,
            },
        }
    }

    fn lookup_label(&self, label: &[u8]) -> LabelSearch<'_> {
        match self {
            HashTree::Labeled(l, child) => match label.cmp(l.as_slice()) {
                core::cmp::Ordering::Equal => LabelSearch::Found(child),
                core::cmp::Ordering::Less => LabelSearch::Less,
                core::cmp::Ordering::Greater => LabelSearch::Greater,
            },
            HashTree::Fork(left, right) => match left.lookup_label(label) {
                LabelSearch::Greater => match right.lookup_label(label) {
                    LabelSearch::Less => LabelSearch::Absent,
                    LabelSearch::NoLabels => LabelSearch::Greater,
                    other => other,
                },
                LabelSearch::Unknown => match right.lookup_label(label) {
                    LabelSearch::Less | LabelSearch::NoLabels => LabelSearch::Unknown,
                    other => other,
                },
                LabelSearch::NoLabels => right.lookup_label(label),
                other => other,
            },
            HashTree::Pruned(_) => LabelSearch::Unknown,
            HashTree::Empty | HashTree::Leaf(_) => LabelSearch::NoLabels,
        }
    }
}

fn domain_hash(domain: &str, parts: &[&[u8]]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([domain.len() as u8]);
    hasher.update(domain.as_bytes());
    for part in parts {
        hasher.update(part);
    }
    Digest(hasher.finalize().into())
}

/// Renders a label path for error messages.
pub fn display_path<L: AsRef<[u8]>>(path: &[L]) -> String {
    let parts: Vec<String> = path
        .iter()
        .map(|label| {
            let bytes = label.as_ref();
            match core::str::from_utf8(bytes) {
                Ok(text) if text.chars().all(|c| c.is_ascii_graphic()) => text.to_string(),
                _ => format!("0x{}", hex::encode(bytes)),
            }
        })
        .collect();
    format!("/{}", parts.join("/"))
}
