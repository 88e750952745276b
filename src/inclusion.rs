// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Certified reads.
//!
//! A read is accepted only when all of the following hold:
//! 1. the requested hash is a real (non-zero) digest,
//! 2. the fetched bytes hash to it,
//! 3. the certificate verifies and commits a root for the store,
//! 4. the witness reconstructs to exactly that root,
//! 5. the witness contains a leaf labeled with the blob's hash, holding that
//!    same hash.
//!
//! Step 5 ties the proof to this particular blob. Without it any valid
//! certificate/witness pair for the store would vouch for arbitrary bytes.

use crate::certificate::CertificateVerifier;
use crate::content::{content_hash, content_label};
use crate::error::{VerifyError, VerifyResult};
use crate::hashtree::{decode_witness, HashTree, LookupResult};
use crate::types::{CertifiedBlock, Digest, StoreId};

/// Checks that `witness` proves the root `certificate` commits for `store`.
///
/// Returns the decoded witness so callers can look further into it.
pub fn check_inclusion(
    certificate: &[u8],
    witness: &[u8],
    store: &StoreId,
    verifier: &CertificateVerifier,
) -> VerifyResult<HashTree> {
    let committed = verifier.verify(certificate, store)?;
    let tree = decode_witness(witness)?;
    let reconstructed = tree.reconstruct();
    if reconstructed != committed {
        return Err(VerifyError::RootMismatch {
            expected: committed,
            actual: reconstructed,
        });
    }
    Ok(tree)
}

/// Requires a leaf under the label derived from `hash` whose value is the
/// hash itself.
pub fn check_content_binding(witness: &HashTree, hash: &Digest) -> VerifyResult<()> {
    let label = content_label(hash);
    match witness.lookup_path(&[label]) {
        LookupResult::Found(value) if value == hash.0.as_slice() => Ok(()),
        _ => Err(VerifyError::ContentNotAttested(*hash)),
    }
}

/// Full acceptance check for a blob fetched by `requested` hash.
pub fn verify_certified_read(
    requested: &Digest,
    block: &CertifiedBlock,
    store: &StoreId,
    verifier: &CertificateVerifier,
) -> VerifyResult<()> {
    if requested.is_zero() {
        return Err(VerifyError::InvalidHash(format!("0x{}", requested.to_hex())));
    }

    let actual = content_hash(&block.data);
    if actual != *requested {
        return Err(VerifyError::ContentHashMismatch {
            requested: *requested,
            actual,
        });
    }

    let witness = check_inclusion(&block.certificate, &block.witness, store, verifier)?;
    check_content_binding(&witness, requested)
}
