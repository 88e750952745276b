// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Content addressing.
//!
//! A blob's address is its BLAKE3 digest. BLAKE3 is itself a Merkle tree over
//! 1 KiB chunks, so the address commits to every chunk of the blob and can be
//! recomputed incrementally.

use crate::types::Digest;

/// Computes the content address of `data`.
pub fn content_hash(data: &[u8]) -> Digest {
    Digest(*blake3::hash(data).as_bytes())
}

/// True if `data` hashes to `expected`.
pub fn valid_hash(expected: &Digest, data: &[u8]) -> bool {
    content_hash(data) == *expected
}

/// Label under which a blob's entry is stored in a store's tree.
pub fn content_label(hash: &Digest) -> Vec<u8> {
    hash.to_hex().into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(content_hash(b"Test-Data"), content_hash(b"Test-Data"));
        assert_ne!(content_hash(b"Test-Data"), content_hash(b"Test-Datb"));
    }

    #[test]
    fn valid_hash_accepts_own_hash() {
        let data = b"some blob";
        assert!(valid_hash(&content_hash(data), data));
        assert!(!valid_hash(&Digest::ZERO, data));
    }

    #[test]
    fn label_is_lowercase_hex() {
        let label = content_label(&Digest([0xAB; 32]));
        assert_eq!(label, "ab".repeat(32).into_bytes());
    }
}
