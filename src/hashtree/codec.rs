// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! CBOR encoding of hash trees.
//!
//! ```text
//! empty      [0]
//! fork       [1, left, right]
//! labeled    [2, label: bytes, child]
//! leaf       [3, value: bytes]
//! pruned     [4, digest: bytes(32)]
//! ```

use serde_cbor::Value;

use super::HashTree;
use crate::error::{VerifyError, VerifyResult};
use crate::types::Digest;

/// Nesting bound; deeper input is rejected rather than risking the stack.
const MAX_DEPTH: usize = 96;

/// Decodes witness bytes. Every failure is a `MalformedWitness`.
pub fn decode_witness(bytes: &[u8]) -> VerifyResult<HashTree> {
    let value: Value =
        serde_cbor::from_slice(bytes).map_err(|e| VerifyError::MalformedWitness(e.to_string()))?;
    tree_from_value(&value).map_err(VerifyError::MalformedWitness)
}

pub fn encode(tree: &HashTree) -> Result<Vec<u8>, serde_cbor::Error> {
    serde_cbor::to_vec(&tree_to_value(tree))
}

pub(crate) fn tree_from_value(value: &Value) -> Result<HashTree, String> {
    node_from_value(value, 0)
}

fn node_from_value(value: &Value, depth: usize) -> Result<HashTree, String> {
    if depth > MAX_DEPTH {
        return Err(format!("tree nested deeper than {}", MAX_DEPTH));
    }
    let items = match value {
        Value::Array(items) => items,
        _ => return Err("tree node is not an array".to_string()),
    };
    let (tag, fields) = items
        .split_first()
        .ok_or_else(|| "tree node is an empty array".to_string())?;
    let tag = match tag {
        Value::Integer(tag) => *tag,
        _ => return Err("tree node tag is not an integer".to_string()),
    };

    match (tag, fields) {
        (0, []) => Ok(HashTree::Empty),
        (1, [left, right]) => Ok(HashTree::fork(
            node_from_value(left, depth + 1)?,
            node_from_value(right, depth + 1)?,
        )),
        (2, [label, child]) => Ok(HashTree::Labeled(
            bytes_field(label, "label")?,
            Box::new(node_from_value(child, depth + 1)?),
        )),
        (3, [leaf]) => Ok(HashTree::Leaf(bytes_field(leaf, "leaf value")?)),
        (4, [digest]) => {
            let raw = bytes_field(digest, "pruned digest")?;
            Digest::from_slice(&raw)
                .map(HashTree::Pruned)
                .ok_or_else(|| format!("pruned digest is {} bytes, expected 32", raw.len()))
        }
        (0..=4, _) => Err(format!("tree node tag {} with {} fields", tag, fields.len())),
        _ => Err(format!("unknown tree node tag {}", tag)),
    }
}

fn bytes_field(value: &Value, what: &str) -> Result<Vec<u8>, String> {
    match value {
        Value::Bytes(bytes) => Ok(bytes.clone()),
        _ => Err(format!("{} is not a byte string", what)),
    }
}

pub(crate) fn tree_to_value(tree: &HashTree) -> Value {
    match tree {
        HashTree::Empty => Value::Array(vec![Value::Integer(0)]),
        HashTree::Fork(left, right) => Value::Array(vec![
            Value::Integer(1),
            tree_to_value(left),
            tree_to_value(right),
        ]),
        HashTree::Labeled(label, child) => Value::Array(vec![
            Value::Integer(2),
            Value::Bytes(label.clone()),
            tree_to_value(child),
        ]),
        HashTree::Leaf(value) => Value::Array(vec![Value::Integer(3), Value::Bytes(value.clone())]),
        HashTree::Pruned(digest) => {
            Value::Array(vec![Value::Integer(4), Value::Bytes(digest.0.to_vec())])
        }
    }
}
